//! estatedash-tui - TUI frontend for estatedash using Ratatui

pub mod app;
pub mod components;
pub mod tabs;
pub mod ui;

pub use app::App;

use anyhow::Result;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use estatedash_core::{DataFetcher, ReportStore, ViewState};
use ratatui::prelude::*;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Run the TUI application until the user quits
pub async fn run(
    store: Arc<ReportStore>,
    fetcher: DataFetcher,
    view: ViewState,
    export_dir: PathBuf,
) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(store, fetcher, view, export_dir);
    let mut ui = ui::Ui::new();

    // First batch; the loop shows the loading screen until it settles
    app.request_refresh();

    let result = run_loop(&mut terminal, &mut app, &mut ui).await;

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

async fn run_loop<B: Backend>(terminal: &mut Terminal<B>, app: &mut App, ui: &mut ui::Ui) -> Result<()>
where
    <B as Backend>::Error: Send + Sync + 'static,
{
    loop {
        app.poll_events();

        terminal.draw(|f| ui.render(f, app))?;

        // Poll input with a short timeout so background batches and the
        // spinner keep updating
        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.handle_key(key.code, key.modifiers);
                }
            }
        }

        if app.should_quit {
            return Ok(());
        }

        // Let spawned fetch tasks make progress on a current-thread runtime
        tokio::task::yield_now().await;
    }
}
