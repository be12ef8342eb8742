use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::config::{self, LoggingSettings};

/// The filter directive used when `RUST_LOG` is not set.
pub fn default_directive<'a>(settings: &'a LoggingSettings, cli_level: Option<&'a str>) -> &'a str {
    cli_level.unwrap_or(&settings.level)
}

/// Send `tracing` output to the log file. The terminal belongs to the UI.
///
/// Returns the log file path. An error here only means there will be no log.
pub fn init(settings: &LoggingSettings, cli_level: Option<&str>) -> Result<PathBuf, String> {
    let path = settings
        .file
        .clone()
        .or_else(config::default_log_path)
        .ok_or_else(|| "no log file location (HOME is unset)".to_string())?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| format!("{}: {e}", parent.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(|e| format!("{}: {e}", path.display()))?;

    let directive = default_directive(settings, cli_level);
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(directive))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_env_filter(filter)
        .try_init()
        .map_err(|e| e.to_string())?;
    Ok(path)
}
