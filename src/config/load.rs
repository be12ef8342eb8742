use std::{env, path::Path, path::PathBuf};

use super::schema::Settings;

impl Settings {
    /// Reads the config file found by [`resolve_config_path`], then applies
    /// `SPOTLITE__` environment overrides.
    pub fn load() -> Result<Self, ::config::ConfigError> {
        Self::load_from(resolve_config_path().as_deref())
    }

    /// Same as [`Settings::load`] with a caller-chosen file. A missing file is not an error.
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, ::config::ConfigError> {
        let mut builder = ::config::Config::builder();

        if let Some(path) = config_path {
            builder = builder.add_source(::config::File::from(path).required(false));
        }

        builder = builder.add_source(
            ::config::Environment::with_prefix("SPOTLITE")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }

    /// Rejects values the player cannot run with. The message names the offending key.
    pub fn validate(&self) -> Result<(), String> {
        if !(50..=500).contains(&self.monitor.poll_interval_ms) {
            return Err("monitor.poll_interval_ms must be within 50..=500".to_string());
        }
        if self.metadata.workers == 0 {
            return Err("metadata.workers must be >= 1".to_string());
        }
        if self.playback.volume > 100 {
            return Err("playback.volume must be within 0..=100".to_string());
        }
        if self.audio.device_timeout_ms == 0 {
            return Err("audio.device_timeout_ms must be >= 1".to_string());
        }
        Ok(())
    }
}

/// `SPOTLITE_CONFIG_PATH` if set, else [`default_config_path`].
pub fn resolve_config_path() -> Option<PathBuf> {
    if let Some(p) = env::var_os("SPOTLITE_CONFIG_PATH") {
        return Some(PathBuf::from(p));
    }
    default_config_path()
}

/// `spotlite/config.toml` under the XDG config directory.
pub fn default_config_path() -> Option<PathBuf> {
    xdg_dir("XDG_CONFIG_HOME", ".config").map(|d| d.join("spotlite").join("config.toml"))
}

/// `spotlite/spotlite.log` under the XDG state directory.
pub fn default_log_path() -> Option<PathBuf> {
    xdg_dir("XDG_STATE_HOME", ".local/state").map(|d| d.join("spotlite").join("spotlite.log"))
}

/// `$var`, or `$HOME/<under_home>` when the variable is unset.
fn xdg_dir(var: &str, under_home: &str) -> Option<PathBuf> {
    env::var_os(var)
        .map(PathBuf::from)
        .or_else(|| env::var_os("HOME").map(|home| PathBuf::from(home).join(under_home)))
}
