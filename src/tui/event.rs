//! Event Handling
//!
//! Turns crossterm key presses and a timer into [`AppAction`]s.

use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use futures::{FutureExt, StreamExt};
use std::time::Duration;
use tokio::sync::mpsc;

/// Actions that can be performed in the application
#[derive(Debug, Clone, PartialEq)]
pub enum AppAction {
    /// Quit the application
    Quit,
    /// Ctrl+C
    ForceQuit,
    /// Pick the highlighted dataset or suggestion (Enter)
    Select,
    /// Move the highlight up
    Up,
    /// Move the highlight down
    Down,
    /// Focus the next list (Tab)
    NextPane,
    /// Focus the previous list (Shift+Tab)
    PrevPane,
    /// Save the current chart as PNG
    Export,
    /// Toggle help view
    ToggleHelp,
    /// Close overlays
    Escape,
    /// Any other key; only used to dismiss overlays
    Other,
    /// Timer tick for the loading spinner
    Tick,
}

/// Event handler for the TUI
pub struct EventHandler {
    rx: mpsc::Receiver<AppAction>,
    _tx: mpsc::Sender<AppAction>,
}

impl EventHandler {
    /// Create a new event handler with specified tick rate
    pub fn new(tick_rate: Duration) -> Self {
        let (tx, rx) = mpsc::channel(100);
        let tx_clone = tx.clone();

        tokio::spawn(async move {
            let mut reader = crossterm::event::EventStream::new();
            let mut tick_interval = tokio::time::interval(tick_rate);

            loop {
                let tick = tick_interval.tick();
                let crossterm_event = reader.next().fuse();

                tokio::select! {
                    _ = tick => {
                        if tx_clone.send(AppAction::Tick).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(evt)) = crossterm_event => {
                        if let Some(action) = Self::map_event(evt) {
                            if tx_clone.send(action).await.is_err() {
                                break;
                            }
                        }
                    }
                }
            }
        });

        Self { rx, _tx: tx }
    }

    /// Wait for the next action
    pub async fn next(&mut self) -> Option<AppAction> {
        self.rx.recv().await
    }

    fn map_event(event: Event) -> Option<AppAction> {
        match event {
            Event::Key(key) if key.kind != KeyEventKind::Release => Self::map_key_event(key),
            _ => None,
        }
    }

    /// Map a key event to an app action
    pub fn map_key_event(key: KeyEvent) -> Option<AppAction> {
        let action = match (key.modifiers, key.code) {
            (KeyModifiers::CONTROL, KeyCode::Char('c')) => AppAction::ForceQuit,
            (KeyModifiers::CONTROL, KeyCode::Char('q')) => AppAction::Quit,
            (KeyModifiers::CONTROL, KeyCode::Char('s')) => AppAction::Export,
            (_, KeyCode::BackTab) => AppAction::PrevPane,

            (KeyModifiers::NONE, code) | (KeyModifiers::SHIFT, code) => match code {
                KeyCode::Char('q') => AppAction::Quit,
                KeyCode::Esc => AppAction::Escape,
                KeyCode::Enter | KeyCode::Char(' ') => AppAction::Select,
                KeyCode::Up | KeyCode::Char('k') => AppAction::Up,
                KeyCode::Down | KeyCode::Char('j') => AppAction::Down,
                KeyCode::Tab | KeyCode::Right | KeyCode::Char('l') => AppAction::NextPane,
                KeyCode::Left | KeyCode::Char('h') => AppAction::PrevPane,
                KeyCode::Char('s') => AppAction::Export,
                KeyCode::F(1) | KeyCode::Char('?') => AppAction::ToggleHelp,
                _ => AppAction::Other,
            },

            _ => AppAction::Other,
        };
        Some(action)
    }
}
