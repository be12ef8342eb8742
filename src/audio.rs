//! Playback device: the trait the session drives, the rodio implementation,
//! and the thread that serializes every call into it.

mod device;
mod sink;
mod thread;

#[cfg(test)]
pub mod mock;

pub use device::PlaybackDevice;
pub use sink::RodioDevice;
pub use thread::AudioThread;
