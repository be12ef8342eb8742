use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use crossterm::execute;
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode};
use ratatui::{Terminal, backend::CrosstermBackend};

use crate::app::{App, Controls};
use crate::audio::{AudioThread, PlaybackDevice, RodioDevice};
use crate::cli::Args;
use crate::metadata::{LoftyReader, MetadataCache};
use crate::monitor::ProgressMonitor;
use crate::playback::PlaybackSession;

mod event_loop;
mod logging;
mod settings;
mod startup;

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let (settings, settings_warning) = settings::load_settings(args.config.as_deref());

    match logging::init(&settings.logging, args.log_level.as_deref()) {
        Ok(path) => tracing::info!(log = %path.display(), "spotlite starting"),
        Err(e) => eprintln!("spotlite: logging disabled: {e}"),
    }
    if let Some(warning) = settings_warning {
        tracing::warn!("{warning}");
    }

    let folder = startup::music_folder(args.folder, &settings.library);
    let (catalog, scan_error) = startup::initial_catalog(&folder, &settings.library);

    let device_timeout = Duration::from_millis(settings.audio.device_timeout_ms);
    let audio = AudioThread::spawn(
        || RodioDevice::open_default().map(|d| Box::new(d) as Box<dyn PlaybackDevice>),
        device_timeout,
    )?;

    let mut session = PlaybackSession::new(audio);
    let mut app_status = None;
    if let Err(e) = session.configure(&settings.playback) {
        tracing::warn!(error = %e, "could not apply playback settings");
        app_status = Some(e.to_string());
    }

    let reader = Arc::new(LoftyReader {
        artwork: settings.metadata.artwork,
    });
    let (metadata, metadata_updates) = MetadataCache::new(reader, settings.metadata.workers);
    metadata.request_catalog(&catalog);

    let monitor = ProgressMonitor::new(&settings.monitor);
    let (ticks, ticker) = monitor.spawn_ticker()?;

    let mut app = App::new(catalog, session, Controls::from(&settings.playback));
    app.current_dir = Some(folder);
    if let Some(e) = scan_error {
        app.catalog_failed(&e, app.catalog.generation());
    }
    if app_status.is_some() {
        app.status = app_status;
    }

    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let run_result = {
        let mut state = event_loop::EventLoopState::default();
        event_loop::run(
            &mut terminal,
            &settings,
            &mut app,
            &monitor,
            &metadata,
            event_loop::Inputs {
                ticks: &ticks,
                metadata_updates: &metadata_updates,
            },
            &mut state,
        )
    };

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    app.session
        .device_mut()
        .shutdown(Duration::from_millis(settings.audio.quit_fade_out_ms));
    // Workers stop at their next send once the receiver is gone.
    drop(metadata_updates);
    metadata.shutdown();
    drop(ticks);
    let _ = ticker.join();
    tracing::info!("spotlite stopped");

    run_result
}
