use std::path::PathBuf;

use serde::Deserialize;

/// Everything spotlite reads from `spotlite/config.toml`, one table per section.
///
/// Missing keys take the defaults below. A `SPOTLITE__SECTION__KEY`
/// environment variable beats the file, e.g. `SPOTLITE__MONITOR__POLL_INTERVAL_MS=100`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub library: LibrarySettings,
    pub playback: PlaybackSettings,
    pub monitor: MonitorSettings,
    pub metadata: MetadataSettings,
    pub audio: AudioSettings,
    pub ui: UiSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LibrarySettings {
    /// Folder scanned on startup when none is given on the command line.
    pub folder: Option<PathBuf>,
    /// Audio extensions, matched case-insensitively and written without the dot.
    pub extensions: Vec<String>,
    /// Descend into subfolders of the music folder.
    pub recursive: bool,
    /// Deepest subfolder level visited when `recursive` is on.
    pub max_depth: Option<usize>,
    /// Dot-prefixed files and folders are skipped unless this is set.
    pub include_hidden: bool,
    /// Symlinked files and folders are resolved while scanning.
    pub follow_links: bool,

    /// Track fields joined into a list row, e.g. `["artist", "title"]`.
    pub display_fields: Vec<TrackDisplayField>,
    /// Placed between the `display_fields` parts.
    pub display_separator: String,
}

impl Default for LibrarySettings {
    fn default() -> Self {
        Self {
            folder: None,
            extensions: ["mp3", "wav", "flac", "ogg", "m4a", "aac"]
                .into_iter()
                .map(String::from)
                .collect(),
            recursive: false,
            max_depth: None,
            include_hidden: true,
            follow_links: true,
            display_fields: vec![TrackDisplayField::Artist, TrackDisplayField::Title],
            display_separator: " - ".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlaybackSettings {
    /// Start with shuffle on.
    pub shuffle: bool,
    /// Repeat mode at startup: `off`, `all` or `one`.
    pub repeat: RepeatSetting,
    /// Initial volume, 0..=100.
    pub volume: u8,
    /// Seconds to jump when seeking with `<` / `>`.
    pub seek_step_seconds: u64,
    /// Volume change per `+` / `-` press.
    pub volume_step: u8,
    /// "Previous" restarts the current track when pressed later than this
    /// many seconds into it. 0 disables.
    pub previous_restarts_after_seconds: u64,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            shuffle: false,
            repeat: RepeatSetting::Off,
            volume: 70,
            seek_step_seconds: 5,
            volume_step: 5,
            previous_restarts_after_seconds: 3,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RepeatSetting {
    #[serde(alias = "no-repeat", alias = "none")]
    Off,
    #[serde(alias = "repeat-all", alias = "loop-all", alias = "loop_all")]
    All,
    #[serde(alias = "repeat-one", alias = "loop-one", alias = "loop_one")]
    One,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MonitorSettings {
    /// How often the progress monitor samples the device (milliseconds).
    pub poll_interval_ms: u64,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            poll_interval_ms: 200,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MetadataSettings {
    /// Number of background tag-reading threads.
    pub workers: usize,
    /// Whether to extract embedded cover art.
    pub artwork: bool,
}

impl Default for MetadataSettings {
    fn default() -> Self {
        Self {
            workers: 2,
            artwork: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AudioSettings {
    /// Longest time the UI waits for the audio thread to answer a command.
    pub device_timeout_ms: u64,
    /// Fade applied to the playing track on quit, in milliseconds. 0 cuts it.
    pub quit_fade_out_ms: u64,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            device_timeout_ms: 2000,
            quit_fade_out_ms: 300,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UiSettings {
    /// Shown centred in the header box.
    pub header_text: String,

    /// Time readouts in the now-playing panel, in display order.
    pub now_playing_time_fields: Vec<TimeField>,

    /// Placed between the time readouts.
    pub now_playing_time_separator: String,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            header_text: " spotlite ".to_string(),
            now_playing_time_fields: vec![TimeField::Elapsed, TimeField::Total],
            now_playing_time_separator: " / ".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default filter directive; `RUST_LOG` wins when set.
    pub level: String,
    /// Log file. Defaults to `$XDG_STATE_HOME/spotlite/spotlite.log`.
    pub file: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

#[derive(Debug, Copy, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TimeField {
    Elapsed,
    Total,
    Remaining,
}

#[derive(Debug, Copy, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TrackDisplayField {
    Title,
    Artist,
    Album,
    Filename,
    Path,
}
