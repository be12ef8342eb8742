//! Playback Session state machine and the selection policy behind next/previous.

mod events;
mod policy;
mod session;

pub use events::PlayerEvent;
pub use policy::{ShuffleHistory, initial_index, next_index, previous_index};
pub use session::{PlaybackSession, PlaybackState, RepeatMode};

#[cfg(test)]
mod tests;
