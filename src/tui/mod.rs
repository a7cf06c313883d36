//! Terminal User Interface Module
//!
//! The interactive dashboard, built with Ratatui.
//!
//! # Layout
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  📊 Smart Data Visualization                                    │
//! ├─────────────────────┬───────────────────────────────────────────┤
//! │ ┌─ Datasets ──────┐ │ ┌─ Result ────────────────────────────┐   │
//! │ │ ▶ Housing Prices│ │ │   Analysis of 'price' by 'city'      │   │
//! │ │   Sales         │ │ │   ███                                │   │
//! │ └─────────────────┘ │ │   ███  ███                           │   │
//! │ ┌─ Suggestions ───┐ │ │   ███  ███                           │   │
//! │ │ ▮ Sum of price  │ │ │  Hanoi Hue                           │   │
//! │ │ ◔ Count per city│ │ └──────────────────────────────────────┘   │
//! │ └─────────────────┘ │                                           │
//! │ Ready │ [Enter] Select [Tab] Switch list [s] Save PNG [q] Quit  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod app;
pub mod event;
pub mod theme;
pub mod ui;
pub mod widgets;

pub use app::{App, AppEvent, Focus, View};
pub use event::{AppAction, EventHandler};

use crate::api::DashboardApi;
use crate::config::Config;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use std::io::{self, Stdout};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

/// Type alias for our terminal backend
pub type Tui = Terminal<CrosstermBackend<Stdout>>;

/// Initialize the terminal for TUI mode
pub fn init_terminal() -> anyhow::Result<Tui> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

/// Restore the terminal to its original state
pub fn restore_terminal(terminal: &mut Tui) -> anyhow::Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

/// Run the TUI application
pub async fn run(config: Config, api: Arc<dyn DashboardApi>) -> anyhow::Result<()> {
    info!(api = %config.api.base_url, "Starting TUI mode");

    let mut terminal = init_terminal()?;

    let tick_rate = Duration::from_millis(config.ui.tick_rate_ms.max(10));
    let mut app = App::new(config, api);
    app.start();

    let mut events = EventHandler::new(tick_rate);

    let result = run_app(&mut terminal, &mut app, &mut events).await;

    if let Err(e) = restore_terminal(&mut terminal) {
        error!("Failed to restore terminal: {}", e);
    }

    result
}

/// Main application loop
async fn run_app(
    terminal: &mut Tui,
    app: &mut App,
    events: &mut EventHandler,
) -> anyhow::Result<()> {
    loop {
        // Apply backend responses that arrived since the last frame
        app.poll_events();

        terminal.draw(|frame| ui::render(frame, app))?;

        match events.next().await {
            Some(action) => app.handle_action(action),
            None => break,
        }

        if app.should_quit {
            break;
        }
    }

    info!("TUI exited normally");
    Ok(())
}
