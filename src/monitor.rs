//! Progress Monitor: samples the device on a fixed cadence, reports elapsed
//! time and triggers auto-advance when a track runs out.
//!
//! The ticker thread only sends [`Tick`]s. The tick itself runs on whichever
//! thread owns the session, so at most one tick is ever in progress.

use std::io;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::audio::PlaybackDevice;
use crate::config::MonitorSettings;
use crate::error::PlaybackError;
use crate::library::Catalog;
use crate::playback::{PlaybackSession, PlaybackState, PlayerEvent};

/// Wake-up signal from the ticker thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick;

/// What a single tick did.
#[derive(Debug)]
pub enum TickOutcome {
    /// Nothing is playing.
    Idle,
    /// The device could not be queried; try again next tick.
    Skipped,
    Progress { elapsed: Duration, duration: Duration },
    /// The track ended and `index` is now playing.
    Advanced { index: usize },
    /// The track ended and nothing follows.
    Ended,
    /// The track ended and the follow-up could not be started.
    Failed(PlaybackError),
}

#[derive(Debug, Clone)]
pub struct ProgressMonitor {
    interval: Duration,
}

impl ProgressMonitor {
    pub fn new(settings: &MonitorSettings) -> Self {
        Self::with_interval(Duration::from_millis(settings.poll_interval_ms))
    }

    pub fn with_interval(interval: Duration) -> Self {
        Self { interval }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Start the ticker thread. It stops on its own once the receiver is dropped.
    pub fn spawn_ticker(&self) -> io::Result<(Receiver<Tick>, JoinHandle<()>)> {
        let (tx, rx) = mpsc::channel();
        let interval = self.interval;
        let join = thread::Builder::new()
            .name("progress-ticker".into())
            .spawn(move || ticker_loop(interval, tx))?;
        Ok((rx, join))
    }

    /// Sample the device once.
    ///
    /// A track counts as finished when the device has nothing left queued, or
    /// when elapsed time reached a known duration.
    pub fn tick<D: PlaybackDevice>(
        &self,
        session: &mut PlaybackSession<D>,
        catalog: &Catalog,
    ) -> TickOutcome {
        if session.state() != PlaybackState::Playing {
            return TickOutcome::Idle;
        }
        let Some(track) = session.current_index().and_then(|i| catalog.get(i)) else {
            return TickOutcome::Idle;
        };
        let duration = track.duration;

        let elapsed = match session.position() {
            Ok(elapsed) => elapsed,
            Err(e) => {
                tracing::debug!(error = %e, "position query failed, skipping tick");
                return TickOutcome::Skipped;
            }
        };
        let busy = match session.is_busy() {
            Ok(busy) => busy,
            Err(e) => {
                tracing::debug!(error = %e, "busy query failed, skipping tick");
                return TickOutcome::Skipped;
            }
        };

        let finished = !busy || (!duration.is_zero() && elapsed >= duration);
        if !finished {
            session.notify(PlayerEvent::Progress { elapsed, duration });
            return TickOutcome::Progress { elapsed, duration };
        }

        tracing::debug!(?elapsed, ?duration, busy, "track finished");
        match session.on_track_finished(catalog) {
            Ok(Some(index)) => TickOutcome::Advanced { index },
            Ok(None) => TickOutcome::Ended,
            Err(e) => {
                tracing::warn!(error = %e, "auto-advance failed");
                TickOutcome::Failed(e)
            }
        }
    }
}

fn ticker_loop(interval: Duration, tx: Sender<Tick>) {
    loop {
        thread::sleep(interval);
        if tx.send(Tick).is_err() {
            break;
        }
    }
}
