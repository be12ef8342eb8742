//! `rodio`-backed playback device.
//!
//! One `Sink` per loaded track. Seeking tries the decoder first and falls
//! back to rebuilding the sink with `skip_duration`.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Duration;

use rodio::{Decoder, OutputStream, OutputStreamBuilder, Sink, Source};

use crate::error::DeviceError;

use super::device::PlaybackDevice;

pub struct RodioDevice {
    stream: OutputStream,
    sink: Option<Sink>,
    location: Option<PathBuf>,
    volume: f32,
    /// Added to `Sink::get_pos` after a rebuild-based seek.
    offset: Duration,
}

impl RodioDevice {
    /// Open the default output device.
    pub fn open_default() -> Result<Self, DeviceError> {
        let mut stream = OutputStreamBuilder::open_default_stream()
            .map_err(|e| DeviceError::Unavailable(e.to_string()))?;
        // rodio logs to stderr when OutputStream is dropped, which corrupts the TUI.
        stream.log_on_drop(false);
        Ok(Self {
            stream,
            sink: None,
            location: None,
            volume: 1.0,
            offset: Duration::ZERO,
        })
    }

    /// Create a paused `Sink` for `location` that starts playback at `start_at`.
    fn create_sink_at(&self, location: &Path, start_at: Duration) -> Result<Sink, DeviceError> {
        let file = File::open(location).map_err(|e| DeviceError::Open {
            path: location.to_path_buf(),
            source: e,
        })?;

        let source = Decoder::new(BufReader::new(file))
            .map_err(|e| DeviceError::Decode {
                path: location.to_path_buf(),
                reason: e.to_string(),
            })?
            // `skip_duration` is the fallback seeking primitive; Duration::ZERO is fine.
            .skip_duration(start_at);

        let sink = Sink::connect_new(self.stream.mixer());
        sink.set_volume(self.volume);
        sink.append(source);
        sink.pause();
        Ok(sink)
    }

    fn sink(&self) -> Result<&Sink, DeviceError> {
        self.sink.as_ref().ok_or(DeviceError::NothingLoaded)
    }
}

impl PlaybackDevice for RodioDevice {
    fn load(&mut self, location: &Path) -> Result<(), DeviceError> {
        let new_sink = self.create_sink_at(location, Duration::ZERO)?;
        if let Some(old) = self.sink.replace(new_sink) {
            old.stop();
        }
        self.location = Some(location.to_path_buf());
        self.offset = Duration::ZERO;
        Ok(())
    }

    fn play(&mut self) -> Result<(), DeviceError> {
        self.sink()?.play();
        Ok(())
    }

    fn pause(&mut self) -> Result<(), DeviceError> {
        self.sink()?.pause();
        Ok(())
    }

    fn resume(&mut self) -> Result<(), DeviceError> {
        self.sink()?.play();
        Ok(())
    }

    fn stop(&mut self) -> Result<(), DeviceError> {
        if let Some(s) = self.sink.take() {
            s.stop();
        }
        self.location = None;
        self.offset = Duration::ZERO;
        Ok(())
    }

    fn set_volume(&mut self, volume: f32) -> Result<(), DeviceError> {
        self.volume = volume.clamp(0.0, 1.0);
        if let Some(s) = self.sink.as_ref() {
            s.set_volume(self.volume);
        }
        Ok(())
    }

    fn seek(&mut self, position: Duration) -> Result<(), DeviceError> {
        let sink = self.sink()?;
        match sink.try_seek(position) {
            Ok(()) => {
                self.offset = Duration::ZERO;
                Ok(())
            }
            Err(e) => {
                tracing::debug!("decoder seek failed ({e}), rebuilding sink");
                let location = self.location.clone().ok_or(DeviceError::NothingLoaded)?;
                let was_paused = sink.is_paused();
                let new_sink = self
                    .create_sink_at(&location, position)
                    .map_err(|e| DeviceError::Seek(e.to_string()))?;
                if !was_paused {
                    new_sink.play();
                }
                if let Some(old) = self.sink.replace(new_sink) {
                    old.stop();
                }
                self.offset = position;
                Ok(())
            }
        }
    }

    fn position(&mut self) -> Result<Duration, DeviceError> {
        Ok(self.offset + self.sink()?.get_pos())
    }

    fn is_busy(&mut self) -> Result<bool, DeviceError> {
        Ok(self.sink.as_ref().is_some_and(|s| !s.empty()))
    }
}
