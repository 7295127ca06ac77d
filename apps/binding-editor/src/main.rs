#![allow(dead_code)]
//! Binding Editor - TUI for inspecting and editing reel key bindings.
//!
//! Features:
//! - Every binding from input.conf with its resolution status
//! - Extension-contributed bindings merged into the same table
//! - Add, edit, delete, and reorder with immediate write-back
//! - Incremental filtering by key or action text

mod app;
mod config;
mod ui;

use anyhow::Result;
use app::App;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::{env, io, path::PathBuf, time::Duration};

fn main() -> Result<()> {
    let args: Vec<String> = env::args().skip(1).collect();
    let read_only = args.iter().any(|arg| arg == "--read-only");
    let conf_path = args
        .iter()
        .find(|arg| !arg.starts_with("--"))
        .map(PathBuf::from);

    init_logging();

    // Load everything before the terminal goes raw so failures print.
    let mut app = App::new(conf_path, read_only)?;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run app
    let result = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

/// File logging, opted into by pointing REEL_LOG at a path. Nothing logs
/// otherwise; stderr belongs to the terminal UI.
fn init_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let Ok(path) = env::var("REEL_LOG") else {
        return;
    };
    let Ok(file) = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
    else {
        return;
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,reel_keybinds=debug"));
    let file_layer = fmt::layer().with_writer(file).with_ansi(false);
    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .init();
    tracing::info!(path, "binding editor started");
}

fn run_app<B: ratatui::backend::Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    loop {
        app.poll_notifications();
        terminal.draw(|f| ui::draw(f, app))?;

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if app.can_quit() && (key.code == crossterm::event::KeyCode::Char('q')) {
                    return Ok(());
                }
                app.handle_key(key);
            }
        }
    }
}
