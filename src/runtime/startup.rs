use std::env;
use std::path::{Path, PathBuf};

use crate::config::LibrarySettings;
use crate::error::CatalogError;
use crate::library::{self, Catalog};

/// First catalog generation. Each rescan bumps it.
pub const FIRST_GENERATION: u64 = 1;

/// Folder to scan: the command line wins, then the config file, then the
/// working directory.
pub fn music_folder(cli: Option<PathBuf>, library: &LibrarySettings) -> PathBuf {
    cli.or_else(|| library.folder.clone())
        .or_else(|| env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Scan `folder` for the initial catalog. A failed scan still yields a
/// (empty) catalog; the error is returned alongside for the status line.
pub fn initial_catalog(folder: &Path, library: &LibrarySettings) -> (Catalog, Option<CatalogError>) {
    match library::scan(folder, library, FIRST_GENERATION) {
        Ok(catalog) => (catalog, None),
        Err(e) => (Catalog::empty(FIRST_GENERATION), Some(e)),
    }
}
