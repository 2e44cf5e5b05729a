mod app;
mod demo;

use std::io::{self, Stdout};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event as CEvent, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

use tweak_config::ConsoleSettings;
use tweak_core::logging::{self, LogBuffer};

use crate::app::App;

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    Ok(Terminal::new(backend)?)
}

fn restore_terminal(mut terminal: Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

fn main() -> Result<()> {
    let (settings, source) = ConsoleSettings::discover().context("loading console settings")?;
    let log_buffer = logging::init(settings.log_capacity);
    match &source {
        Some(path) => tracing::info!(path = %path.display(), "settings loaded"),
        None => tracing::info!("no tweak.toml found, using defaults"),
    }
    tracing::info!("tweak demo starting up");

    let mut terminal = setup_terminal()?;
    let res = run(&mut terminal, settings, log_buffer);
    restore_terminal(terminal)?;
    res
}

fn run(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    settings: ConsoleSettings,
    log_buffer: LogBuffer,
) -> Result<()> {
    let mut app = App::new(settings, Some(log_buffer));
    let tick_interval = Duration::from_millis(100);
    let poll_timeout = Duration::from_millis(16);
    let mut last_tick = Instant::now();

    loop {
        // ── Sync logs from tracing into console ──
        app.sync_logs();

        // ── Render ──
        terminal.draw(|f| app.draw(f))?;

        // ── Input ──
        if event::poll(poll_timeout)? {
            if let CEvent::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press && app.handle_key(key) {
                    break;
                }
            }
        }

        if last_tick.elapsed() >= tick_interval {
            last_tick = Instant::now();
            app.tick();
        }
    }

    app.shutdown();
    Ok(())
}
