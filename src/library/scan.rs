use std::collections::HashSet;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use walkdir::WalkDir;

use crate::config::LibrarySettings;
use crate::error::CatalogError;

use super::model::{Catalog, Track};

/// Which directory entries count as tracks, built once per scan.
struct AudioFilter {
    extensions: HashSet<String>,
    include_hidden: bool,
}

impl AudioFilter {
    fn new(settings: &LibrarySettings) -> Self {
        let extensions = settings
            .extensions
            .iter()
            .map(|e| e.trim().trim_start_matches('.').to_ascii_lowercase())
            .filter(|e| !e.is_empty())
            .collect();
        Self {
            extensions,
            include_hidden: settings.include_hidden,
        }
    }

    fn visible(&self, path: &Path) -> bool {
        self.include_hidden || !name_of(path).is_some_and(|n| n.starts_with('.'))
    }

    fn is_audio(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|s| s.to_str())
            .is_some_and(|ext| self.extensions.contains(&ext.to_ascii_lowercase()))
    }
}

fn name_of(path: &Path) -> Option<&str> {
    path.file_name().and_then(|s| s.to_str())
}

fn check_folder(dir: &Path) -> Result<(), CatalogError> {
    let meta = fs::metadata(dir).map_err(|e| match e.kind() {
        ErrorKind::NotFound => CatalogError::NotFound(dir.to_path_buf()),
        _ => CatalogError::Unreadable {
            path: dir.to_path_buf(),
            source: e,
        },
    })?;
    if !meta.is_dir() {
        return Err(CatalogError::NotADirectory(dir.to_path_buf()));
    }
    fs::read_dir(dir).map_err(|e| CatalogError::Unreadable {
        path: dir.to_path_buf(),
        source: e,
    })?;
    Ok(())
}

/// Scan `dir` for supported audio files.
///
/// Tracks come back unresolved: title is the filename stem and duration is
/// zero. Tags are read later by the metadata cache so a large folder lists
/// instantly.
pub fn scan(dir: &Path, settings: &LibrarySettings, generation: u64) -> Result<Catalog, CatalogError> {
    check_folder(dir)?;

    let filter = AudioFilter::new(settings);
    let max_depth = match (settings.recursive, settings.max_depth) {
        (false, _) => 1,
        (true, Some(depth)) => depth,
        (true, None) => usize::MAX,
    };
    let walker = WalkDir::new(dir)
        .follow_links(settings.follow_links)
        .max_depth(max_depth)
        .into_iter()
        // The root itself may be a dot folder the user asked for.
        .filter_entry(|e| e.depth() == 0 || filter.visible(e.path()));

    let mut tracks = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("skipping unreadable entry: {e}");
                continue;
            }
        };
        // walkdir reports the target's type for followed links.
        if entry.file_type().is_file() && filter.is_audio(entry.path()) {
            tracks.push(Track::from_location(entry.path()));
        }
    }

    let catalog = Catalog::new(tracks, Some(dir.to_path_buf()), generation);
    tracing::info!(
        folder = %dir.display(),
        tracks = catalog.len(),
        generation,
        "scanned folder"
    );
    Ok(catalog)
}
