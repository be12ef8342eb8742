use std::path::Path;

use crate::config;

/// Load and validate settings, falling back to defaults.
///
/// Logging is not up yet when this runs, so the reason for a fallback is
/// handed back for the caller to log.
pub fn load_settings(explicit: Option<&Path>) -> (config::Settings, Option<String>) {
    let loaded = match explicit {
        Some(path) => config::Settings::load_from(Some(path)),
        None => config::Settings::load(),
    };
    match loaded {
        Ok(s) => match s.validate() {
            Ok(()) => (s, None),
            Err(msg) => (
                config::Settings::default(),
                Some(format!("invalid config, using defaults: {msg}")),
            ),
        },
        // Config is optional; failures should not prevent the app from starting.
        Err(e) => (
            config::Settings::default(),
            Some(format!("failed to load config, using defaults: {e}")),
        ),
    }
}
