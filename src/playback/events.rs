use std::time::Duration;

use super::session::{PlaybackState, RepeatMode};

/// Notifications from the session and progress monitor to the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerEvent {
    StateChanged(PlaybackState),
    /// A new track was loaded and started.
    TrackChanged { index: usize },
    Progress { elapsed: Duration, duration: Duration },
    ShuffleChanged(bool),
    RepeatChanged(RepeatMode),
    /// Volume in percent.
    VolumeChanged(f32),
}
