use super::load::{default_config_path, default_log_path, resolve_config_path};
use super::schema::*;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

/// Tests that touch process environment run one at a time.
static ENV: Mutex<()> = Mutex::new(());

/// Holds the environment lock and puts every variable it changed back on drop.
struct ScopedEnv {
    saved: Vec<(&'static str, Option<OsString>)>,
    _lock: MutexGuard<'static, ()>,
}

impl ScopedEnv {
    fn new() -> Self {
        Self {
            saved: Vec::new(),
            _lock: ENV.lock().unwrap_or_else(|e| e.into_inner()),
        }
    }

    fn set(mut self, key: &'static str, value: &str) -> Self {
        self.saved.push((key, std::env::var_os(key)));
        unsafe { std::env::set_var(key, value) };
        self
    }

    fn unset(mut self, key: &'static str) -> Self {
        self.saved.push((key, std::env::var_os(key)));
        unsafe { std::env::remove_var(key) };
        self
    }
}

impl Drop for ScopedEnv {
    fn drop(&mut self) {
        for (key, old) in self.saved.drain(..).rev() {
            match old {
                Some(v) => unsafe { std::env::set_var(key, v) },
                None => unsafe { std::env::remove_var(key) },
            }
        }
    }
}

#[test]
fn explicit_config_path_variable_wins() {
    let _env = ScopedEnv::new().set("SPOTLITE_CONFIG_PATH", "/tmp/elsewhere/spotlite.toml");
    assert_eq!(
        resolve_config_path(),
        Some(PathBuf::from("/tmp/elsewhere/spotlite.toml"))
    );
}

#[test]
fn config_lives_under_xdg_config_home_when_set() {
    let _env = ScopedEnv::new()
        .unset("SPOTLITE_CONFIG_PATH")
        .set("XDG_CONFIG_HOME", "/tmp/cfg")
        .set("HOME", "/tmp/not-used");
    assert_eq!(
        resolve_config_path(),
        Some(PathBuf::from("/tmp/cfg/spotlite/config.toml"))
    );
    assert_eq!(default_config_path(), resolve_config_path());
}

#[test]
fn log_file_defaults_to_local_state_under_home() {
    let _env = ScopedEnv::new()
        .unset("XDG_STATE_HOME")
        .set("HOME", "/tmp/someone");
    assert_eq!(
        default_log_path(),
        Some(PathBuf::from("/tmp/someone/.local/state/spotlite/spotlite.log"))
    );
}

#[test]
fn defaults_match_the_supported_format_list() {
    let s = Settings::default();
    assert_eq!(
        s.library.extensions,
        vec!["mp3", "wav", "flac", "ogg", "m4a", "aac"]
    );
    assert!(!s.library.recursive);
    assert_eq!(s.playback.repeat, RepeatSetting::Off);
    assert_eq!(s.playback.volume, 70);
    assert!(s.validate().is_ok());
}

#[test]
fn settings_load_from_config_file_and_parse_repeat_aliases() {
    let _env = ScopedEnv::new().unset("SPOTLITE__MONITOR__POLL_INTERVAL_MS");

    let dir = tempfile::tempdir().unwrap();
    let cfg_path = dir.path().join("config.toml");
    std::fs::write(
        &cfg_path,
        r#"
[library]
folder = "/srv/music"
extensions = ["mp3"]
recursive = true
display_fields = ["filename"]

[playback]
shuffle = true
repeat = "repeat-one"
volume = 40
previous_restarts_after_seconds = 0

[monitor]
poll_interval_ms = 120

[metadata]
workers = 4
artwork = false

[ui]
now_playing_time_fields = ["elapsed", "remaining"]
now_playing_time_separator = " | "

[logging]
level = "debug"
"#,
    )
    .unwrap();

    let s = Settings::load_from(Some(&cfg_path)).unwrap();
    assert_eq!(
        s.library.folder.as_deref(),
        Some(Path::new("/srv/music"))
    );
    assert_eq!(s.library.extensions, vec!["mp3".to_string()]);
    assert!(s.library.recursive);
    assert!(matches!(
        s.library.display_fields[0],
        TrackDisplayField::Filename
    ));
    assert!(s.playback.shuffle);
    assert_eq!(s.playback.repeat, RepeatSetting::One);
    assert_eq!(s.playback.volume, 40);
    assert_eq!(s.playback.previous_restarts_after_seconds, 0);
    assert_eq!(s.monitor.poll_interval_ms, 120);
    assert_eq!(s.metadata.workers, 4);
    assert!(!s.metadata.artwork);
    assert!(matches!(
        s.ui.now_playing_time_fields[1],
        TimeField::Remaining
    ));
    assert_eq!(s.ui.now_playing_time_separator, " | ");
    assert_eq!(s.logging.level, "debug");
}

#[test]
fn settings_env_overrides_config_file() {

    let dir = tempfile::tempdir().unwrap();
    let cfg_path = dir.path().join("config.toml");
    std::fs::write(
        &cfg_path,
        r#"
[monitor]
poll_interval_ms = 300
"#,
    )
    .unwrap();

    let _env = ScopedEnv::new().set("SPOTLITE__MONITOR__POLL_INTERVAL_MS", "100");

    let s = Settings::load_from(Some(&cfg_path)).unwrap();
    assert_eq!(s.monitor.poll_interval_ms, 100);
}

#[test]
fn validate_rejects_poll_interval_outside_responsive_window() {
    let mut s = Settings::default();
    s.monitor.poll_interval_ms = 10;
    assert!(s.validate().is_err());
    s.monitor.poll_interval_ms = 900;
    assert!(s.validate().is_err());
    s.monitor.poll_interval_ms = 250;
    assert!(s.validate().is_ok());
}

#[test]
fn validate_rejects_zero_workers_and_loud_volume() {
    let mut s = Settings::default();
    s.metadata.workers = 0;
    assert!(s.validate().is_err());

    let mut s = Settings::default();
    s.playback.volume = 101;
    assert!(s.validate().is_err());
}
