use std::sync::mpsc::{self, Receiver, Sender};
use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::audio::PlaybackDevice;
use crate::config::{PlaybackSettings, RepeatSetting};
use crate::error::{DeviceError, PlaybackError};
use crate::library::Catalog;

use super::events::PlayerEvent;
use super::policy::{self, ShuffleHistory};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    #[default]
    Stopped,
    Playing,
    Paused,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RepeatMode {
    #[default]
    Off,
    All,
    One,
}

impl RepeatMode {
    /// Off -> All -> One -> Off.
    pub fn cycle(self) -> Self {
        match self {
            RepeatMode::Off => RepeatMode::All,
            RepeatMode::All => RepeatMode::One,
            RepeatMode::One => RepeatMode::Off,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RepeatMode::Off => "off",
            RepeatMode::All => "all",
            RepeatMode::One => "one",
        }
    }
}

impl From<RepeatSetting> for RepeatMode {
    fn from(value: RepeatSetting) -> Self {
        match value {
            RepeatSetting::Off => RepeatMode::Off,
            RepeatSetting::All => RepeatMode::All,
            RepeatSetting::One => RepeatMode::One,
        }
    }
}

/// The single active playback state: what is loaded and whether it plays.
///
/// Indices are always relative to the full catalog passed into each call,
/// never to a filtered view. Every device command goes through `D`, which in
/// the running program is the audio thread.
pub struct PlaybackSession<D: PlaybackDevice> {
    device: D,
    state: PlaybackState,
    current_index: Option<usize>,
    shuffle: bool,
    repeat: RepeatMode,
    /// Percent, 0..=100.
    volume: f32,
    history: ShuffleHistory,
    rng: StdRng,
    events: Option<Sender<PlayerEvent>>,
}

impl<D: PlaybackDevice> PlaybackSession<D> {
    pub fn new(device: D) -> Self {
        Self {
            device,
            state: PlaybackState::Stopped,
            current_index: None,
            shuffle: false,
            repeat: RepeatMode::Off,
            volume: 100.0,
            history: ShuffleHistory::default(),
            rng: StdRng::from_os_rng(),
            events: None,
        }
    }

    /// Replace the shuffle RNG, e.g. with a seeded one.
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    /// Apply configured shuffle, repeat and volume.
    pub fn configure(&mut self, settings: &PlaybackSettings) -> Result<(), PlaybackError> {
        self.shuffle = settings.shuffle;
        self.repeat = settings.repeat.into();
        self.set_volume(f32::from(settings.volume))
    }

    /// Start receiving [`PlayerEvent`]s. A later call replaces the earlier receiver.
    pub fn subscribe(&mut self) -> Receiver<PlayerEvent> {
        let (tx, rx) = mpsc::channel();
        self.events = Some(tx);
        rx
    }

    pub(crate) fn notify(&self, event: PlayerEvent) {
        if let Some(tx) = &self.events {
            let _ = tx.send(event);
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current_index
    }

    pub fn shuffle(&self) -> bool {
        self.shuffle
    }

    pub fn repeat(&self) -> RepeatMode {
        self.repeat
    }

    /// Volume in percent.
    pub fn volume_percent(&self) -> f32 {
        self.volume
    }

    /// Volume as the device sees it, 0.0..=1.0.
    pub fn volume(&self) -> f32 {
        self.volume / 100.0
    }

    pub fn history(&self) -> &ShuffleHistory {
        &self.history
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    fn set_state(&mut self, state: PlaybackState) {
        if self.state != state {
            self.state = state;
            self.notify(PlayerEvent::StateChanged(state));
        }
    }

    /// Load and start the track at `index`.
    ///
    /// A load the device rejects changes nothing. Once the device has swapped
    /// tracks the old one is gone, so two failures leave the session
    /// `Stopped` with `current_index` untouched: a track that loaded but would
    /// not start, and a load that timed out (the audio thread stops whatever
    /// it finishes loading).
    pub fn play(&mut self, index: usize, catalog: &Catalog) -> Result<(), PlaybackError> {
        let len = catalog.len();
        if len == 0 {
            return Err(PlaybackError::NoTracks);
        }
        let track = catalog
            .get(index)
            .ok_or(PlaybackError::IndexOutOfRange { index, len })?;

        if let Err(source) = self.device.load(&track.location) {
            tracing::warn!(location = %track.location.display(), error = %source, "load failed");
            if matches!(source, DeviceError::Timeout(_)) {
                self.set_state(PlaybackState::Stopped);
            }
            return Err(PlaybackError::Load {
                track: track.title.clone(),
                source,
            });
        }
        if let Err(source) = self.device.play() {
            tracing::warn!(location = %track.location.display(), error = %source, "start failed");
            let _ = self.device.stop();
            self.set_state(PlaybackState::Stopped);
            return Err(PlaybackError::Load {
                track: track.title.clone(),
                source,
            });
        }

        tracing::info!(index, location = %track.location.display(), "playing");
        self.current_index = Some(index);
        self.history.insert(index);
        self.notify(PlayerEvent::TrackChanged { index });
        self.set_state(PlaybackState::Playing);
        Ok(())
    }

    /// Pause if playing; otherwise nothing happens.
    pub fn pause(&mut self) -> Result<(), PlaybackError> {
        if self.state == PlaybackState::Playing {
            self.device.pause()?;
            self.set_state(PlaybackState::Paused);
        }
        Ok(())
    }

    /// Resume if paused; otherwise nothing happens.
    pub fn resume(&mut self) -> Result<(), PlaybackError> {
        if self.state == PlaybackState::Paused {
            self.device.resume()?;
            self.set_state(PlaybackState::Playing);
        }
        Ok(())
    }

    /// Halt the device. `current_index` is kept so play/pause picks up the same track.
    pub fn stop(&mut self) -> Result<(), PlaybackError> {
        let result = self.device.stop();
        self.set_state(PlaybackState::Stopped);
        result.map_err(PlaybackError::from)
    }

    pub fn toggle_play_pause(&mut self, catalog: &Catalog) -> Result<(), PlaybackError> {
        match self.state {
            PlaybackState::Stopped => {
                let len = catalog.len();
                let index = self
                    .current_index
                    .filter(|&i| i < len)
                    .or_else(|| policy::initial_index(len, self.shuffle, &mut self.rng))
                    .ok_or(PlaybackError::NoTracks)?;
                self.play(index, catalog)
            }
            PlaybackState::Playing => self.pause(),
            PlaybackState::Paused => self.resume(),
        }
    }

    /// Play whatever the selection policy picks after the current track.
    pub fn next(&mut self, catalog: &Catalog) -> Result<usize, PlaybackError> {
        let index = policy::next_index(
            self.current_index,
            catalog.len(),
            self.shuffle,
            &mut self.history,
            &mut self.rng,
        )
        .ok_or(PlaybackError::NoTracks)?;
        self.play(index, catalog)?;
        Ok(index)
    }

    /// Play the literal predecessor of the current track, shuffle or not.
    pub fn previous(&mut self, catalog: &Catalog) -> Result<usize, PlaybackError> {
        let index = policy::previous_index(self.current_index, catalog.len())
            .ok_or(PlaybackError::NoTracks)?;
        self.play(index, catalog)?;
        Ok(index)
    }

    /// Like [`previous`](Self::previous), but restarts the current track
    /// instead when it has been playing longer than `restart_after`.
    /// Returns the index now playing.
    pub fn previous_or_restart(
        &mut self,
        catalog: &Catalog,
        restart_after: Option<Duration>,
    ) -> Result<usize, PlaybackError> {
        if let (Some(threshold), Some(current)) = (restart_after, self.current_index) {
            if self.state != PlaybackState::Stopped {
                let elapsed = self.device.position().unwrap_or(Duration::ZERO);
                if elapsed > threshold {
                    self.device.seek(Duration::ZERO)?;
                    return Ok(current);
                }
            }
        }
        self.previous(catalog)
    }

    /// Auto-advance after the current track ran out.
    ///
    /// Repeat-one replays the same index. Anything else moves on through the
    /// selection policy. If the follow-up fails the session stops rather than
    /// retrying, and the error is returned. `Ok(None)` means nothing plays.
    pub fn on_track_finished(&mut self, catalog: &Catalog) -> Result<Option<usize>, PlaybackError> {
        let outcome = match (self.repeat, self.current_index) {
            _ if catalog.is_empty() => Ok(None),
            (RepeatMode::One, Some(index)) if index < catalog.len() => {
                self.play(index, catalog).map(|()| Some(index))
            }
            _ => self.next(catalog).map(Some),
        };

        match outcome {
            Ok(Some(index)) => Ok(Some(index)),
            Ok(None) => {
                let _ = self.stop();
                Ok(None)
            }
            Err(err) => {
                let _ = self.stop();
                Err(err)
            }
        }
    }

    /// Flip shuffle. Each flip starts a fresh cycle seeded with the current track.
    pub fn toggle_shuffle(&mut self) -> bool {
        self.shuffle = !self.shuffle;
        self.history.clear();
        if let Some(index) = self.current_index {
            self.history.insert(index);
        }
        self.notify(PlayerEvent::ShuffleChanged(self.shuffle));
        self.shuffle
    }

    pub fn cycle_repeat(&mut self) -> RepeatMode {
        self.repeat = self.repeat.cycle();
        self.notify(PlayerEvent::RepeatChanged(self.repeat));
        self.repeat
    }

    /// Clamp `percent` to 0..=100 and apply it to the device right away.
    pub fn set_volume(&mut self, percent: f32) -> Result<(), PlaybackError> {
        let percent = if percent.is_nan() {
            0.0
        } else {
            percent.clamp(0.0, 100.0)
        };
        self.device.set_volume(percent / 100.0)?;
        self.volume = percent;
        self.notify(PlayerEvent::VolumeChanged(percent));
        Ok(())
    }

    /// Best-effort jump within the loaded track. Paused stays paused.
    pub fn seek(&mut self, position: Duration) -> Result<(), PlaybackError> {
        if self.state == PlaybackState::Stopped {
            return Err(PlaybackError::NothingLoaded);
        }
        self.device.seek(position)?;
        Ok(())
    }

    /// Seek relative to the current position, clamped at the start. Returns the target.
    pub fn seek_by(&mut self, delta_seconds: i64) -> Result<Duration, PlaybackError> {
        if self.state == PlaybackState::Stopped {
            return Err(PlaybackError::NothingLoaded);
        }
        let current = self.device.position()?;
        let step = Duration::from_secs(delta_seconds.unsigned_abs());
        let target = if delta_seconds < 0 {
            current.saturating_sub(step)
        } else {
            current + step
        };
        self.device.seek(target)?;
        Ok(target)
    }

    /// Elapsed time in the loaded track.
    pub fn position(&mut self) -> Result<Duration, DeviceError> {
        self.device.position()
    }

    /// Whether the device still has audio queued.
    pub fn is_busy(&mut self) -> Result<bool, DeviceError> {
        self.device.is_busy()
    }

    /// Re-point the session at `new` after a rescan replaced `old`.
    ///
    /// The loaded track keeps playing if its location survived; otherwise the
    /// session stops and forgets the index. Shuffle history starts over.
    pub fn rebind(&mut self, old: &Catalog, new: &Catalog) {
        self.history.clear();
        let location = self
            .current_index
            .and_then(|i| old.get(i))
            .map(|t| t.location.clone());

        match location.and_then(|loc| new.position_of(&loc)) {
            Some(index) => {
                self.current_index = Some(index);
                if self.state != PlaybackState::Stopped {
                    self.history.insert(index);
                }
            }
            None => {
                if self.state != PlaybackState::Stopped {
                    let _ = self.stop();
                }
                self.current_index = None;
            }
        }
    }
}
