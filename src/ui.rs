//! Terminal rendering.
//!
//! Everything here reads the [`App`] model and draws it with `ratatui`.
//! Nothing in this module changes state.

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style, Stylize},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Padding, Paragraph, Wrap},
};
use std::time::Duration;

use crate::app::App;
use crate::audio::PlaybackDevice;
use crate::config::{Settings, TimeField, UiSettings};
use crate::library::{Track, display_from_fields, format_length, format_mmss};
use crate::playback::PlaybackState;

const LEFT_PAD: Padding = Padding {
    left: 1,
    right: 0,
    top: 0,
    bottom: 0,
};

/// Render the controls help text, incorporating the seek step.
fn controls_text(seek_seconds: u64) -> String {
    [
        "[j/k] up/down".to_string(),
        "[gg/G] top/bottom".to_string(),
        "[enter] play selected".to_string(),
        "[space/p] play/pause".to_string(),
        "[x] stop".to_string(),
        "[h/l] prev/next".to_string(),
        format!("[H/L] seek -/+{seek_seconds}s"),
        "[-/+] volume".to_string(),
        "[s] shuffle".to_string(),
        "[r] repeat".to_string(),
        "[/] filter".to_string(),
        "[R] rescan".to_string(),
        "[K] metadata".to_string(),
        "[q] quit".to_string(),
    ]
    .join(" | ")
}

fn state_label(state: PlaybackState) -> &'static str {
    match state {
        PlaybackState::Stopped => "Stopped",
        PlaybackState::Playing => "Playing",
        PlaybackState::Paused => "Paused",
    }
}

/// The time readout of the now-playing panel, in the order `ui` lists the fields.
///
/// Total and remaining need a resolved duration; until then total shows `--:--`
/// and remaining is left out.
fn now_playing_time_text(elapsed: Duration, total: Duration, ui: &UiSettings) -> Option<String> {
    let parts: Vec<String> = ui
        .now_playing_time_fields
        .iter()
        .filter_map(|f| match f {
            TimeField::Elapsed => Some(format_mmss(elapsed)),
            TimeField::Total => Some(format_length(total)),
            TimeField::Remaining => (!total.is_zero())
                .then(|| format!("-{}", format_mmss(total.saturating_sub(elapsed)))),
        })
        .collect();

    if parts.is_empty() {
        None
    } else {
        Some(parts.join(&ui.now_playing_time_separator))
    }
}

/// Lines of the now-playing panel.
fn now_playing_text<D: PlaybackDevice>(app: &App<D>, settings: &Settings) -> String {
    let session = &app.session;
    let mut parts: Vec<String> = vec![state_label(session.state()).to_string()];

    match app.now_playing() {
        Some((index, track)) => {
            parts.push(format!("Track {} of {}", index + 1, app.catalog.len()));
            let song = display_from_fields(
                track,
                &settings.library.display_fields,
                &settings.library.display_separator,
            );
            match now_playing_time_text(app.elapsed, track.duration, &settings.ui) {
                Some(time) => parts.push(format!("{song} [{time}]")),
                None => parts.push(song),
            }
        }
        None => parts.push(format!("{} tracks", app.catalog.len())),
    }

    parts.push(format!(
        "Shuffle: {}",
        if session.shuffle() { "ON" } else { "OFF" }
    ));
    parts.push(format!("Repeat: {}", session.repeat().label()));
    parts.push(format!("Volume: {:.0}%", session.volume_percent()));

    let q = app.filter_query.trim();
    if app.filter_mode || !q.is_empty() {
        parts.push(format!("FILTER: {q}"));
    }

    if let Some(dir) = &app.current_dir {
        parts.push(format!("Dir: {}", dir.display()));
    }

    parts.join(" • ")
}

fn metadata_text(track: Option<&Track>) -> String {
    let Some(track) = track else {
        return "No track selected".to_string();
    };
    let art = match &track.artwork {
        Some(art) => format!(
            "{} ({} KB)",
            art.mime_type.as_deref().unwrap_or("image"),
            art.data.len().div_ceil(1024)
        ),
        None => "-".to_string(),
    };
    format!(
        "Title: {}\nArtist: {}\nAlbum: {}\nDuration: {}\nArtwork: {}\nPath: {}",
        track.title,
        track.artist.as_deref().unwrap_or("-"),
        track.album.as_deref().unwrap_or("-"),
        format_length(track.duration),
        art,
        track.location.display()
    )
}

/// A `width` x `height` popup in the middle of `area`, shrunk to leave a border.
fn centered_rect_sized(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width.saturating_sub(2)).max(10);
    let height = height.min(area.height.saturating_sub(2)).max(5);
    Rect {
        x: area.x + area.width.saturating_sub(width) / 2,
        y: area.y + area.height.saturating_sub(height) / 2,
        width,
        height,
    }
}

/// Visible slice of the list that keeps the selection centered when possible.
///
/// Returns `(start, end, selected_position_within_slice)`.
fn visible_window(total: usize, height: usize, selected_pos: usize) -> (usize, usize, usize) {
    if total <= height || height == 0 {
        return (0, total, selected_pos);
    }
    let half = height / 2;
    let mut start = selected_pos.saturating_sub(half);
    if start + height > total {
        start = total - height;
    }
    (start, start + height, selected_pos - start)
}

/// Render the entire UI into `frame`.
pub fn draw<D: PlaybackDevice>(
    frame: &mut Frame,
    app: &App<D>,
    display: &[usize],
    settings: &Settings,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(5),
            Constraint::Min(1),
            Constraint::Length(3),
            Constraint::Length(4),
        ])
        .split(frame.area());

    let header = Paragraph::new(settings.ui.header_text.as_str())
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" spotlite ")
                .title_alignment(Alignment::Center),
        );
    frame.render_widget(header, chunks[0]);

    let now_playing = Paragraph::new(now_playing_text(app, settings))
        .block(Block::bordered().padding(LEFT_PAD).title(" now playing "))
        .wrap(Wrap { trim: true });
    frame.render_widget(now_playing, chunks[1]);

    // Track list. Only the visible window is turned into ListItems.
    {
        let total = display.len();
        let list_height = chunks[2].height.saturating_sub(2) as usize;
        let sel_pos = display.iter().position(|&i| i == app.selected).unwrap_or(0);
        let (start, end, selected_in_window) = visible_window(total, list_height, sel_pos);
        let playing = app.session.current_index();

        let items: Vec<ListItem> = display[start..end]
            .iter()
            .filter_map(|&i| {
                let track = app.catalog.get(i)?;
                let label = display_from_fields(
                    track,
                    &settings.library.display_fields,
                    &settings.library.display_separator,
                );
                let line = format!("{label}  {}", format_length(track.duration));
                Some(if playing == Some(i) {
                    ListItem::new(format!("♪ {line}")).bold()
                } else {
                    ListItem::new(format!("  {line}"))
                })
            })
            .collect();

        let title = format!(" tracks ({}/{}) ", total, app.catalog.len());
        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).title(title))
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
            .highlight_symbol("> ");
        let mut state = ListState::default();
        if total > 0 {
            state.select(Some(selected_in_window));
        }
        frame.render_stateful_widget(list, chunks[2], &mut state);
    }

    if app.metadata_window {
        let popup_area = centered_rect_sized(72, 10, chunks[2]);
        frame.render_widget(Clear, popup_area);
        let meta = Paragraph::new(metadata_text(app.selected_track()))
            .block(
                Block::default()
                    .padding(LEFT_PAD)
                    .borders(Borders::ALL)
                    .title(" metadata (K closes) "),
            )
            .wrap(Wrap { trim: true });
        frame.render_widget(meta, popup_area);
    }

    let status = Paragraph::new(app.status.as_deref().unwrap_or(""))
        .block(Block::bordered().padding(LEFT_PAD).title(" status "));
    frame.render_widget(status, chunks[3]);

    let footer = Paragraph::new(controls_text(settings.playback.seek_step_seconds))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" controls ")
                .padding(LEFT_PAD),
        )
        .wrap(Wrap { trim: true });
    frame.render_widget(footer, chunks[4]);
}
