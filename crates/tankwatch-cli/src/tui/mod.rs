//! Terminal dashboard.
//!
//! This module ties together the TUI components and provides the main event
//! loop. It handles:
//!
//! - Terminal setup and restoration
//! - Channel creation for worker communication
//! - The main event loop with input handling and rendering
//! - Graceful shutdown coordination
//!
//! It can be used standalone (when only the `tui` feature is enabled) or as
//! the `dashboard` subcommand of the CLI.

pub mod app;
pub mod input;
pub mod messages;
pub mod ui;
pub mod worker;

pub use app::App;
pub use messages::{Command, LoadEvent};
pub use worker::LoadWorker;

use std::fs::{self, OpenOptions};
use std::io::{self, stdout};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::{
    ExecutableCommand,
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind},
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::prelude::*;
use time::UtcOffset;
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use tankwatch_core::{Source, Store};

use crate::config::Config;

/// Startup options of the terminal dashboard.
#[derive(Debug, Clone)]
pub struct Options {
    pub config: Config,
    /// Sensor log path or URL.
    pub source: String,
    pub local_offset: UtcOffset,
}

/// Send logs to `path`. The terminal itself is owned by the dashboard.
pub fn init_file_logging(path: &Path, verbose: bool) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create log directory: {}", parent.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file: {}", path.display()))?;

    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to install file logger: {e}"))
}

/// Set up the terminal for TUI rendering.
///
/// Enables raw mode, mouse capture, and switches to the alternate screen buffer.
pub fn setup_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    stdout().execute(EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout());
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

/// Restore the terminal to its original state.
///
/// Disables mouse capture, raw mode and returns to the main screen buffer.
pub fn restore_terminal() -> Result<()> {
    stdout().execute(DisableMouseCapture)?;
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;
    Ok(())
}

/// Run the terminal dashboard.
///
/// 1. Creates the shared store and the channels between UI and worker
/// 2. Spawns the load worker and requests the first load
/// 3. Runs the main event loop
/// 4. Shuts the worker down
pub async fn run(options: Options) -> Result<()> {
    let (cmd_tx, cmd_rx) = mpsc::channel::<Command>(8);
    let (event_tx, event_rx) = mpsc::channel::<LoadEvent>(8);

    let store = Arc::new(Store::new());
    let source = Source::parse(&options.source);
    info!("Sensor log source: {}", source);

    let worker = LoadWorker::new(
        cmd_rx,
        event_tx,
        Arc::clone(&store),
        source,
        options.local_offset,
    );
    let worker_handle = tokio::spawn(worker.run());

    let mut app = App::new(
        &options.config,
        options.source.clone(),
        store,
        options.local_offset,
        event_rx,
    );

    let mut terminal = setup_terminal()?;

    let _ = cmd_tx.try_send(Command::Reload);

    let result = run_event_loop(&mut terminal, &mut app, &cmd_tx).await;

    let _ = cmd_tx.try_send(Command::Shutdown);

    restore_terminal()?;

    let _ = worker_handle.await;

    result
}

/// Main event loop.
async fn run_event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    command_tx: &mpsc::Sender<Command>,
) -> Result<()> {
    while !app.should_quit() {
        let size = terminal.size()?;
        let ui = ui::layout(Rect::new(0, 0, size.width, size.height));
        app.update_layout(ui.charts);

        terminal.draw(|f| ui::draw(f, app))?;

        // Poll for keyboard and mouse events with timeout
        if event::poll(Duration::from_millis(100))? {
            let action = match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => input::handle_key(key.code),
                Event::Mouse(mouse_event) => input::handle_mouse(mouse_event),
                _ => input::Action::None,
            };
            if let Some(cmd) = input::apply_action(app, action) {
                let _ = command_tx.try_send(cmd);
            }
        }

        // Non-blocking receive of load events
        while let Ok(event) = app.event_rx.try_recv() {
            app.handle_load_event(event);
        }

        tokio::task::yield_now().await;
    }

    Ok(())
}
