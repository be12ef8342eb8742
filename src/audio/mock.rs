//! Scriptable in-memory device for tests.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use crate::error::DeviceError;

use super::device::PlaybackDevice;

#[derive(Debug, Default)]
pub struct MockState {
    pub calls: Vec<String>,
    pub loaded: Option<PathBuf>,
    pub playing: bool,
    pub volume: f32,
    pub position: Duration,
    pub busy: bool,
    pub failing_loads: HashSet<PathBuf>,
    pub queries_fail: bool,
    pub play_fails: bool,
    /// How long `load` takes, to stand in for a slow decoder.
    pub load_delay: Duration,
}

/// Cloning shares the same state, so a test can keep one handle while the
/// session owns the other.
#[derive(Debug, Clone, Default)]
pub struct MockDevice {
    state: Arc<Mutex<MockState>>,
}

impl MockDevice {
    pub fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn fail_load(&self, location: impl Into<PathBuf>) {
        self.state().failing_loads.insert(location.into());
    }

    /// Pretend the loaded track ran out.
    pub fn finish(&self) {
        let mut s = self.state();
        s.busy = false;
        s.playing = false;
    }

    pub fn calls(&self) -> Vec<String> {
        self.state().calls.clone()
    }

    fn record(&self, call: String) -> MutexGuard<'_, MockState> {
        let mut s = self.state();
        s.calls.push(call);
        s
    }
}

impl PlaybackDevice for MockDevice {
    fn load(&mut self, location: &Path) -> Result<(), DeviceError> {
        let delay = self.state().load_delay;
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
        let mut s = self.record(format!("load {}", location.display()));
        if s.failing_loads.contains(location) {
            return Err(DeviceError::Decode {
                path: location.to_path_buf(),
                reason: "unsupported format".into(),
            });
        }
        s.loaded = Some(location.to_path_buf());
        s.playing = false;
        s.busy = true;
        s.position = Duration::ZERO;
        Ok(())
    }

    fn play(&mut self) -> Result<(), DeviceError> {
        let mut s = self.record("play".into());
        if s.loaded.is_none() {
            return Err(DeviceError::NothingLoaded);
        }
        if s.play_fails {
            return Err(DeviceError::Unavailable("output went away".into()));
        }
        s.playing = true;
        Ok(())
    }

    fn pause(&mut self) -> Result<(), DeviceError> {
        self.record("pause".into()).playing = false;
        Ok(())
    }

    fn resume(&mut self) -> Result<(), DeviceError> {
        self.record("resume".into()).playing = true;
        Ok(())
    }

    fn stop(&mut self) -> Result<(), DeviceError> {
        let mut s = self.record("stop".into());
        s.loaded = None;
        s.playing = false;
        s.busy = false;
        Ok(())
    }

    fn set_volume(&mut self, volume: f32) -> Result<(), DeviceError> {
        self.record(format!("volume {volume:.2}")).volume = volume;
        Ok(())
    }

    fn seek(&mut self, position: Duration) -> Result<(), DeviceError> {
        let mut s = self.record(format!("seek {}", position.as_secs()));
        if s.loaded.is_none() {
            return Err(DeviceError::NothingLoaded);
        }
        s.position = position;
        Ok(())
    }

    fn position(&mut self) -> Result<Duration, DeviceError> {
        let s = self.state();
        if s.queries_fail {
            return Err(DeviceError::Timeout(Duration::from_millis(1)));
        }
        Ok(s.position)
    }

    fn is_busy(&mut self) -> Result<bool, DeviceError> {
        let s = self.state();
        if s.queries_fail {
            return Err(DeviceError::Timeout(Duration::from_millis(1)));
        }
        Ok(s.busy)
    }
}
