use std::sync::mpsc::Receiver;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{Terminal, backend::CrosstermBackend};

use crate::app::App;
use crate::audio::PlaybackDevice;
use crate::config;
use crate::metadata::{MetadataCache, MetadataUpdate};
use crate::monitor::{ProgressMonitor, Tick};
use crate::ui;

/// Two-key prefixes waiting for their second key.
#[derive(Debug, Default)]
pub struct EventLoopState {
    pending_gg: bool,
    pending_zz: bool,
}

/// What the loop should do after a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    Continue,
    /// The catalog was replaced; its tracks need metadata.
    Rescanned,
    Quit,
}

/// Background channels the loop drains every iteration.
pub struct Inputs<'a> {
    pub ticks: &'a Receiver<Tick>,
    pub metadata_updates: &'a Receiver<MetadataUpdate>,
}

/// Main terminal event loop: drains background hand-offs, draws, handles
/// input. Returns `Ok(())` when the user quits.
pub fn run<D: PlaybackDevice>(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    settings: &config::Settings,
    app: &mut App<D>,
    monitor: &ProgressMonitor,
    metadata: &MetadataCache,
    inputs: Inputs<'_>,
    state: &mut EventLoopState,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        // Ticks pile up while we block on input; one sample covers them all.
        if inputs.ticks.try_iter().count() > 0 {
            app.on_tick(monitor);
        }
        for update in inputs.metadata_updates.try_iter() {
            app.apply_metadata(update);
        }
        app.drain_events();

        let display = app.display_indices();
        terminal.draw(|f| ui::draw(f, app, &display, settings))?;

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                match handle_key_event(key, settings, app, state) {
                    KeyOutcome::Quit => return Ok(()),
                    KeyOutcome::Rescanned => {
                        let queued = metadata.request_catalog(&app.catalog);
                        tracing::debug!(queued, "metadata requested after rescan");
                    }
                    KeyOutcome::Continue => {}
                }
            }
        }
    }
}

pub fn handle_key_event<D: PlaybackDevice>(
    key: KeyEvent,
    settings: &config::Settings,
    app: &mut App<D>,
    state: &mut EventLoopState,
) -> KeyOutcome {
    if app.filter_mode {
        state.pending_gg = false;
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc => app.clear_filter(),
            KeyCode::Backspace => app.pop_filter_char(),
            KeyCode::Down => app.select_next(),
            KeyCode::Up => app.select_prev(),
            KeyCode::Char('j' | 'n') if ctrl => app.select_next(),
            KeyCode::Char('k' | 'p') if ctrl => app.select_prev(),
            KeyCode::Char(c) if !c.is_control() => app.push_filter_char(c),
            KeyCode::Enter => {
                if !app.display_indices().is_empty() {
                    app.exit_filter_mode();
                    app.play_selected();
                }
            }
            _ => {}
        }
        return KeyOutcome::Continue;
    }

    // Any key other than a second `g`/`z` cancels the pending prefix.
    let code = key.code;
    if code != KeyCode::Char('g') {
        state.pending_gg = false;
    }
    if code != KeyCode::Char('z') {
        state.pending_zz = false;
    }

    match code {
        KeyCode::Char('q') => return KeyOutcome::Quit,
        KeyCode::Char('/') => app.enter_filter_mode(),
        KeyCode::Char('s') => app.toggle_shuffle(),
        KeyCode::Char('r') => app.cycle_repeat(),
        KeyCode::Char('R') => {
            if app.rescan(&settings.library) {
                return KeyOutcome::Rescanned;
            }
        }
        KeyCode::Char('g') => {
            if state.pending_gg {
                state.pending_gg = false;
                app.follow_playback_off();
                app.select_first();
            } else {
                state.pending_gg = true;
            }
        }
        KeyCode::Char('G') => {
            app.follow_playback_off();
            app.select_last();
        }
        // `zz` jumps the cursor back to the playing track.
        KeyCode::Char('z') => {
            if state.pending_zz {
                state.pending_zz = false;
                if let Some((index, _)) = app.now_playing() {
                    app.follow_playback_on();
                    app.set_selected(index);
                }
            } else {
                state.pending_zz = true;
            }
        }
        KeyCode::Char('j') | KeyCode::Down => {
            app.follow_playback_off();
            app.select_next();
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.follow_playback_off();
            app.select_prev();
        }
        KeyCode::Enter => {
            let already_playing = app.now_playing().map(|(i, _)| i) == Some(app.selected)
                && app.session.state() != crate::playback::PlaybackState::Stopped;
            if !already_playing {
                app.play_selected();
            }
        }
        KeyCode::Char('p' | ' ') => app.toggle_play_pause(),
        KeyCode::Char('x') => app.stop(),
        KeyCode::Char('l') => app.next_track(),
        KeyCode::Char('h') => app.previous_track(),
        KeyCode::Char('L') | KeyCode::Right => app.seek_forward(),
        KeyCode::Char('H') | KeyCode::Left => app.seek_back(),
        KeyCode::Char('+' | '=') => app.volume_up(),
        KeyCode::Char('-') => app.volume_down(),
        KeyCode::Char('K') => app.toggle_metadata_window(),
        _ => {}
    }

    KeyOutcome::Continue
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::Controls;
    use crate::audio::mock::MockDevice;
    use crate::library::{Catalog, Track};
    use crate::playback::{PlaybackSession, PlaybackState};

    fn app() -> (App<MockDevice>, MockDevice) {
        let tracks = ["one", "two", "three"]
            .iter()
            .map(|n| Track::from_location(format!("/music/{n}.ogg")))
            .collect();
        let mock = MockDevice::default();
        let session = PlaybackSession::new(mock.clone());
        let catalog = Catalog::new(tracks, None, 1);
        (App::new(catalog, session, Controls::default()), mock)
    }

    fn press(
        app: &mut App<MockDevice>,
        state: &mut EventLoopState,
        code: KeyCode,
    ) -> KeyOutcome {
        let settings = config::Settings::default();
        handle_key_event(KeyEvent::new(code, KeyModifiers::NONE), &settings, app, state)
    }

    #[test]
    fn space_toggles_playback() {
        let (mut app, _) = app();
        let mut state = EventLoopState::default();
        press(&mut app, &mut state, KeyCode::Char(' '));
        assert_eq!(app.session.state(), PlaybackState::Playing);
        press(&mut app, &mut state, KeyCode::Char('p'));
        assert_eq!(app.session.state(), PlaybackState::Paused);
    }

    #[test]
    fn q_quits() {
        let (mut app, _) = app();
        let mut state = EventLoopState::default();
        assert_eq!(press(&mut app, &mut state, KeyCode::Char('q')), KeyOutcome::Quit);
    }

    #[test]
    fn filter_then_enter_plays_match() {
        let (mut app, mock) = app();
        let mut state = EventLoopState::default();
        press(&mut app, &mut state, KeyCode::Char('/'));
        for c in "thr".chars() {
            press(&mut app, &mut state, KeyCode::Char(c));
        }
        // Letters typed in filter mode never trigger commands.
        assert!(mock.calls().is_empty());
        press(&mut app, &mut state, KeyCode::Enter);

        assert!(!app.filter_mode);
        let playing = app.now_playing().map(|(_, t)| t.title.clone());
        assert_eq!(playing.as_deref(), Some("three"));
    }

    #[test]
    fn gg_and_g_jump_to_ends() {
        let (mut app, _) = app();
        let mut state = EventLoopState::default();
        press(&mut app, &mut state, KeyCode::Char('G'));
        assert_eq!(app.selected, 2);
        press(&mut app, &mut state, KeyCode::Char('g'));
        assert_eq!(app.selected, 2);
        press(&mut app, &mut state, KeyCode::Char('g'));
        assert_eq!(app.selected, 0);
    }

    #[test]
    fn zz_returns_cursor_to_playing_track() {
        let (mut app, _) = app();
        let mut state = EventLoopState::default();
        press(&mut app, &mut state, KeyCode::Char('l'));
        app.drain_events();
        press(&mut app, &mut state, KeyCode::Char('G'));
        press(&mut app, &mut state, KeyCode::Char('z'));
        press(&mut app, &mut state, KeyCode::Char('z'));
        assert_eq!(Some(app.selected), app.session.current_index());
    }

    #[test]
    fn enter_on_playing_track_does_not_restart_it() {
        let (mut app, mock) = app();
        let mut state = EventLoopState::default();
        press(&mut app, &mut state, KeyCode::Enter);
        press(&mut app, &mut state, KeyCode::Enter);
        let loads = mock.calls().iter().filter(|c| c.starts_with("load")).count();
        assert_eq!(loads, 1);
    }
}
