//! Error types shared across the catalog, metadata and playback layers.
//!
//! None of these are fatal: the runtime recovers from each one locally and
//! at most shows a status message.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// The music folder could not be scanned.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("folder not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("not a folder: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("cannot read folder {}: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Tag reading failed. Only ever logged.
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("cannot read tags from {}: {reason}", path.display())]
    Unreadable { path: PathBuf, reason: String },
}

/// A call into the playback device failed.
#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("audio output unavailable: {0}")]
    Unavailable(String),

    #[error("cannot open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot decode {}: {reason}", path.display())]
    Decode { path: PathBuf, reason: String },

    #[error("nothing loaded")]
    NothingLoaded,

    #[error("seek failed: {0}")]
    Seek(String),

    #[error("device did not answer within {0:?}")]
    Timeout(Duration),

    #[error("audio thread is gone")]
    Disconnected,
}

/// A session operation failed. The session is left in its prior stable state.
#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("no tracks")]
    NoTracks,

    #[error("track index {index} out of range (catalog has {len})")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("nothing is loaded")]
    NothingLoaded,

    #[error("could not play {track}: {source}")]
    Load {
        track: String,
        #[source]
        source: DeviceError,
    },

    #[error(transparent)]
    Device(#[from] DeviceError),
}
