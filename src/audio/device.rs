use std::path::Path;
use std::time::Duration;

use crate::error::DeviceError;

/// The opaque playback device the session drives.
///
/// `load` replaces whatever was loaded before, but only once the new source
/// has opened successfully: a failed load leaves the previous track intact.
pub trait PlaybackDevice {
    fn load(&mut self, location: &Path) -> Result<(), DeviceError>;
    fn play(&mut self) -> Result<(), DeviceError>;
    fn pause(&mut self) -> Result<(), DeviceError>;
    fn resume(&mut self) -> Result<(), DeviceError>;
    fn stop(&mut self) -> Result<(), DeviceError>;
    /// `volume` is linear gain in `0.0..=1.0`.
    fn set_volume(&mut self, volume: f32) -> Result<(), DeviceError>;
    /// Best effort; the landing position may differ slightly from `position`.
    fn seek(&mut self, position: Duration) -> Result<(), DeviceError>;
    fn position(&mut self) -> Result<Duration, DeviceError>;
    /// `true` while a loaded track still has audio left, paused or not.
    fn is_busy(&mut self) -> Result<bool, DeviceError>;
}
