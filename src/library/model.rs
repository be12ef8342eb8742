use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Embedded cover art, as raw encoded image bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artwork {
    pub mime_type: Option<String>,
    pub data: Vec<u8>,
}

/// One playable file plus its (possibly unresolved) metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    /// Unique key within a catalog.
    pub location: PathBuf,
    /// Filename stem until tags say otherwise.
    pub title: String,
    pub artist: Option<String>,
    pub album: Option<String>,
    /// `Duration::ZERO` until resolved.
    pub duration: Duration,
    pub artwork: Option<Arc<Artwork>>,
}

impl Track {
    /// A fresh, unresolved track for `location`.
    pub fn from_location(location: impl Into<PathBuf>) -> Self {
        let location = location.into();
        let title = location
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("UNKNOWN")
            .to_string();
        Self {
            location,
            title,
            artist: None,
            album: None,
            duration: Duration::ZERO,
            artwork: None,
        }
    }

    /// Whether a duration has been resolved for this track.
    pub fn has_duration(&self) -> bool {
        !self.duration.is_zero()
    }
}

/// Ordered, location-unique list of tracks from one folder scan.
///
/// A catalog is never edited piecemeal: a rescan builds a new one with a
/// higher `generation`. The only in-place change is folding in resolved
/// metadata via [`Catalog::apply_resolved`].
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    tracks: Vec<Track>,
    folder: Option<PathBuf>,
    generation: u64,
}

impl Catalog {
    /// Build a catalog from `tracks`, sorting by location and dropping duplicates.
    pub fn new(mut tracks: Vec<Track>, folder: Option<PathBuf>, generation: u64) -> Self {
        tracks.sort_by(|a, b| a.location.cmp(&b.location));
        tracks.dedup_by(|a, b| a.location == b.location);
        Self {
            tracks,
            folder,
            generation,
        }
    }

    pub fn empty(generation: u64) -> Self {
        Self {
            tracks: Vec::new(),
            folder: None,
            generation,
        }
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn get(&self, index: usize) -> Option<&Track> {
        self.tracks.get(index)
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn folder(&self) -> Option<&Path> {
        self.folder.as_deref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn position_of(&self, location: &Path) -> Option<usize> {
        self.tracks
            .binary_search_by(|t| t.location.as_path().cmp(location))
            .ok()
    }

    /// Fold a resolved track back in.
    ///
    /// Returns `false` (and changes nothing) when the result belongs to an
    /// older scan or the slot no longer holds the same location.
    pub fn apply_resolved(&mut self, generation: u64, index: usize, track: Track) -> bool {
        if generation != self.generation {
            return false;
        }
        match self.tracks.get_mut(index) {
            Some(slot) if slot.location == track.location => {
                *slot = track;
                true
            }
            _ => false,
        }
    }
}
