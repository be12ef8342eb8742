use std::time::Duration;

use crate::config::TrackDisplayField;

use super::model::Track;

/// The list label for `track`: the configured `fields` joined by `sep`.
///
/// Blank fields are left out. If nothing is left the title is used.
pub fn display_from_fields(track: &Track, fields: &[TrackDisplayField], sep: &str) -> String {
    let parts: Vec<String> = fields
        .iter()
        .filter_map(|field| field_text(track, *field))
        .collect();

    if parts.is_empty() {
        track.title.clone()
    } else {
        parts.join(sep)
    }
}

fn field_text(track: &Track, field: TrackDisplayField) -> Option<String> {
    let text = match field {
        TrackDisplayField::Title => non_blank(Some(&track.title)),
        TrackDisplayField::Artist => non_blank(track.artist.as_deref()),
        TrackDisplayField::Album => non_blank(track.album.as_deref()),
        TrackDisplayField::Filename => non_blank(track.location.file_stem().and_then(|s| s.to_str())),
        TrackDisplayField::Path => return Some(track.location.display().to_string()),
    };
    text.map(str::to_string)
}

fn non_blank(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

/// Format a `Duration` as `MM:SS`.
pub fn format_mmss(d: Duration) -> String {
    let secs = d.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

/// Like [`format_mmss`], but an unresolved (zero) length shows as `--:--`.
pub fn format_length(d: Duration) -> String {
    if d.is_zero() {
        "--:--".to_string()
    } else {
        format_mmss(d)
    }
}
