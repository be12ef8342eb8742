//! Application model: the catalog, the playback session and everything the
//! terminal UI shows around them.
//!
//! Only the foreground thread touches an `App`. Background work reaches it
//! through [`App::drain_events`] and [`App::apply_metadata`].

use std::path::{Path, PathBuf};
use std::sync::mpsc::Receiver;
use std::time::Duration;

use crate::audio::PlaybackDevice;
use crate::config::{LibrarySettings, PlaybackSettings};
use crate::error::{CatalogError, PlaybackError};
use crate::library::{self, Catalog, Track};
use crate::metadata::MetadataUpdate;
use crate::monitor::{ProgressMonitor, TickOutcome};
use crate::playback::{PlaybackSession, PlaybackState, PlayerEvent};

/// Step sizes and thresholds for the user commands.
#[derive(Debug, Clone, Copy)]
pub struct Controls {
    pub seek_step_seconds: u64,
    pub volume_step: f32,
    /// `None` disables restart-on-previous.
    pub restart_after: Option<Duration>,
}

impl From<&PlaybackSettings> for Controls {
    fn from(p: &PlaybackSettings) -> Self {
        Self {
            seek_step_seconds: p.seek_step_seconds,
            volume_step: f32::from(p.volume_step),
            restart_after: (p.previous_restarts_after_seconds > 0)
                .then(|| Duration::from_secs(p.previous_restarts_after_seconds)),
        }
    }
}

impl Default for Controls {
    fn default() -> Self {
        Self::from(&PlaybackSettings::default())
    }
}

/// Screen state around a [`PlaybackSession`]: list cursor, filter and status line.
pub struct App<D: PlaybackDevice> {
    pub catalog: Catalog,
    pub session: PlaybackSession<D>,
    events: Receiver<PlayerEvent>,
    pub controls: Controls,

    /// Catalog index under the cursor.
    pub selected: usize,
    /// Cursor jumps to each new track while set.
    pub follow_playback: bool,
    pub filter_mode: bool,
    pub filter_query: String,
    pub metadata_window: bool,

    /// Last elapsed time reported for the loaded track.
    pub elapsed: Duration,
    /// One-line notification shown under the now-playing panel.
    pub status: Option<String>,
    pub current_dir: Option<PathBuf>,
}

impl<D: PlaybackDevice> App<D> {
    pub fn new(catalog: Catalog, mut session: PlaybackSession<D>, controls: Controls) -> Self {
        let events = session.subscribe();
        let current_dir = catalog.folder().map(Path::to_path_buf);
        let mut app = Self {
            catalog,
            session,
            events,
            controls,
            selected: 0,
            follow_playback: true,
            filter_mode: false,
            filter_query: String::new(),
            metadata_window: false,
            elapsed: Duration::ZERO,
            status: None,
            current_dir,
        };
        app.status = Some(app.loaded_message());
        app
    }

    fn loaded_message(&self) -> String {
        match self.catalog.len() {
            0 => "No tracks found".to_string(),
            1 => "Loaded 1 track".to_string(),
            n => format!("Loaded {n} tracks"),
        }
    }

    pub fn has_tracks(&self) -> bool {
        !self.catalog.is_empty()
    }

    /// Catalog indices visible under the current filter, in catalog order.
    pub fn display_indices(&self) -> Vec<usize> {
        library::filter(&self.catalog, &self.filter_query)
            .indices()
            .to_vec()
    }

    /// The loaded track and its catalog index, if any.
    pub fn now_playing(&self) -> Option<(usize, &Track)> {
        let index = self.session.current_index()?;
        self.catalog.get(index).map(|t| (index, t))
    }

    pub fn selected_track(&self) -> Option<&Track> {
        self.catalog.get(self.selected)
    }

    pub fn toggle_metadata_window(&mut self) {
        self.metadata_window = !self.metadata_window;
    }

    pub fn follow_playback_on(&mut self) {
        self.follow_playback = true;
    }

    pub fn follow_playback_off(&mut self) {
        self.follow_playback = false;
    }

    // Cursor movement, always within the visible view.

    pub fn set_selected(&mut self, index: usize) {
        self.selected = index;
        self.ensure_selected_visible();
    }

    /// Next visible index after `current`, wrapping to the top.
    pub fn next_in_view_from(&self, current: usize) -> Option<usize> {
        let display = self.display_indices();
        let first = *display.first()?;
        Some(match display.iter().position(|&i| i == current) {
            Some(p) => display[(p + 1) % display.len()],
            None => first,
        })
    }

    /// Previous visible index before `current`, wrapping to the bottom.
    pub fn prev_in_view_from(&self, current: usize) -> Option<usize> {
        let display = self.display_indices();
        let last = *display.last()?;
        Some(match display.iter().position(|&i| i == current) {
            Some(0) | None => last,
            Some(p) => display[p - 1],
        })
    }

    pub fn select_next(&mut self) {
        if let Some(next) = self.next_in_view_from(self.selected) {
            self.selected = next;
        }
    }

    pub fn select_prev(&mut self) {
        if let Some(prev) = self.prev_in_view_from(self.selected) {
            self.selected = prev;
        }
    }

    pub fn select_first(&mut self) {
        if let Some(&first) = self.display_indices().first() {
            self.selected = first;
        }
    }

    pub fn select_last(&mut self) {
        if let Some(&last) = self.display_indices().last() {
            self.selected = last;
        }
    }

    fn ensure_selected_visible(&mut self) {
        let display = self.display_indices();
        match display.first() {
            None => self.selected = 0,
            Some(&first) if !display.contains(&self.selected) => self.selected = first,
            Some(_) => {}
        }
    }

    // Filtering. The view changes; catalog indices never do.

    pub fn enter_filter_mode(&mut self) {
        self.filter_mode = true;
        self.follow_playback_off();
        self.ensure_selected_visible();
    }

    pub fn exit_filter_mode(&mut self) {
        self.filter_mode = false;
    }

    pub fn clear_filter(&mut self) {
        self.filter_query.clear();
        self.filter_mode = false;
        self.ensure_selected_visible();
    }

    pub fn push_filter_char(&mut self, c: char) {
        self.filter_query.push(c);
        self.ensure_selected_visible();
    }

    pub fn pop_filter_char(&mut self) {
        self.filter_query.pop();
        self.ensure_selected_visible();
    }

    // User commands. Failures end up in the status line and the log.

    fn report(&mut self, err: PlaybackError) {
        tracing::warn!(error = %err, "playback command failed");
        self.status = Some(err.to_string());
    }

    fn run(&mut self, result: Result<(), PlaybackError>) {
        match result {
            Ok(()) => self.status = None,
            Err(e) => self.report(e),
        }
    }

    pub fn play_selected(&mut self) {
        if !self.display_indices().contains(&self.selected) {
            return;
        }
        self.follow_playback_on();
        let result = self.session.play(self.selected, &self.catalog);
        self.run(result);
    }

    pub fn toggle_play_pause(&mut self) {
        let result = self.session.toggle_play_pause(&self.catalog);
        self.run(result);
    }

    pub fn stop(&mut self) {
        let result = self.session.stop();
        self.run(result);
    }

    pub fn next_track(&mut self) {
        let result = self.session.next(&self.catalog).map(drop);
        self.run(result);
    }

    pub fn previous_track(&mut self) {
        let result = self
            .session
            .previous_or_restart(&self.catalog, self.controls.restart_after)
            .map(drop);
        self.run(result);
    }

    pub fn toggle_shuffle(&mut self) {
        self.session.toggle_shuffle();
    }

    pub fn cycle_repeat(&mut self) {
        self.session.cycle_repeat();
    }

    pub fn volume_up(&mut self) {
        let target = self.session.volume_percent() + self.controls.volume_step;
        let result = self.session.set_volume(target);
        self.run(result);
    }

    pub fn volume_down(&mut self) {
        let target = self.session.volume_percent() - self.controls.volume_step;
        let result = self.session.set_volume(target);
        self.run(result);
    }

    pub fn seek_forward(&mut self) {
        self.seek_by(self.controls.seek_step_seconds as i64);
    }

    pub fn seek_back(&mut self) {
        self.seek_by(-(self.controls.seek_step_seconds as i64));
    }

    fn seek_by(&mut self, delta: i64) {
        match self.session.seek_by(delta) {
            Ok(target) => self.elapsed = target,
            Err(e) => self.report(e),
        }
    }

    // Background hand-offs.

    /// Run one progress tick against the session.
    pub fn on_tick(&mut self, monitor: &ProgressMonitor) {
        match monitor.tick(&mut self.session, &self.catalog) {
            TickOutcome::Failed(e) => self.report(e),
            TickOutcome::Ended => self.status = Some("End of catalog".to_string()),
            _ => {}
        }
    }

    /// Fold pending session notifications into the view state.
    pub fn drain_events(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            match event {
                PlayerEvent::Progress { elapsed, .. } => self.elapsed = elapsed,
                PlayerEvent::TrackChanged { index } => {
                    self.elapsed = Duration::ZERO;
                    if self.follow_playback && !self.filter_mode {
                        self.set_selected(index);
                    }
                }
                PlayerEvent::StateChanged(PlaybackState::Stopped) => {
                    self.elapsed = Duration::ZERO;
                }
                PlayerEvent::StateChanged(_)
                | PlayerEvent::ShuffleChanged(_)
                | PlayerEvent::RepeatChanged(_)
                | PlayerEvent::VolumeChanged(_) => {}
            }
        }
    }

    /// Apply a resolved track. Stale results are dropped.
    pub fn apply_metadata(&mut self, update: MetadataUpdate) -> bool {
        let MetadataUpdate {
            generation,
            index,
            track,
        } = update;
        let applied = self.catalog.apply_resolved(generation, index, track);
        if !applied {
            tracing::debug!(generation, index, "dropping stale metadata");
        }
        applied
    }

    /// Swap in a freshly scanned catalog, keeping the loaded track when it survived.
    pub fn replace_catalog(&mut self, catalog: Catalog) {
        // Queued events carry indices into the old catalog.
        self.drain_events();
        let selected_location = self.selected_track().map(|t| t.location.clone());
        self.session.rebind(&self.catalog, &catalog);
        self.catalog = catalog;
        if let Some(folder) = self.catalog.folder() {
            self.current_dir = Some(folder.to_path_buf());
        }

        self.selected = selected_location
            .and_then(|loc| self.catalog.position_of(&loc))
            .unwrap_or(0);
        self.ensure_selected_visible();
        if self.session.state() == PlaybackState::Stopped {
            self.elapsed = Duration::ZERO;
        }
        // Whatever rebind emitted is already in new-catalog terms.
        self.drain_events();
        self.status = Some(self.loaded_message());
    }

    /// Rescan the current folder. Returns `true` when a new catalog was installed.
    ///
    /// A failed scan leaves an empty catalog behind and says why in the status line.
    pub fn rescan(&mut self, settings: &LibrarySettings) -> bool {
        let Some(dir) = self.current_dir.clone() else {
            self.status = Some("No folder to rescan".to_string());
            return false;
        };
        let generation = self.catalog.generation() + 1;
        match library::scan(&dir, settings, generation) {
            Ok(catalog) => {
                self.replace_catalog(catalog);
                true
            }
            Err(e) => {
                self.catalog_failed(&e, generation);
                false
            }
        }
    }

    /// Present an empty catalog after a failed scan.
    pub fn catalog_failed(&mut self, err: &CatalogError, generation: u64) {
        tracing::warn!(error = %err, "scan failed");
        self.replace_catalog(Catalog::empty(generation));
        self.status = Some(err.to_string());
    }
}
