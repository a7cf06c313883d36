//! Application State
//!
//! Holds the workflow plus cursor and overlay state for the TUI. Backend calls
//! and PNG exports run in spawned tasks and report back through an
//! [`AppEvent`] channel.

use crate::api::DashboardApi;
use crate::chart::export::write_png;
use crate::config::Config;
use crate::report::Reporter;
use crate::tui::event::AppAction;
use crate::types::{AnalysisResult, AppError, AppResult, Catalog, DatasetId, Suggestion};
use crate::workflow::{Applied, RequestTag, Workflow};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

/// Current view/screen
#[derive(Debug, Clone, PartialEq, Default)]
pub enum View {
    #[default]
    Dashboard,
    Help,
}

/// Which list receives Up/Down/Enter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    #[default]
    Datasets,
    Suggestions,
}

/// Results of background work delivered to the UI task
#[derive(Debug)]
pub enum AppEvent {
    DatasetsLoaded(AppResult<Vec<DatasetId>>),
    SuggestionsLoaded {
        tag: RequestTag,
        result: AppResult<Catalog>,
    },
    AnalysisLoaded {
        tag: RequestTag,
        result: AppResult<AnalysisResult>,
    },
    /// PNG export finished on the blocking pool
    ExportFinished {
        path: PathBuf,
        result: anyhow::Result<()>,
    },
}

/// Main application state
pub struct App {
    pub config: Config,

    // UI State
    pub view: View,
    pub focus: Focus,
    pub should_quit: bool,
    pub dataset_cursor: usize,
    pub suggestion_cursor: usize,
    /// Blocking message shown until the next key press
    pub alert: Option<String>,
    /// Result of the last export
    pub status: Option<String>,
    pub datasets_loading: bool,
    pub spinner_frame: usize,

    pub workflow: Workflow,

    api: Arc<dyn DashboardApi>,

    // Async communication
    event_rx: mpsc::Receiver<AppEvent>,
    event_tx: mpsc::Sender<AppEvent>,
}

impl App {
    /// Create a new application instance
    pub fn new(config: Config, api: Arc<dyn DashboardApi>) -> Self {
        let reporter = Reporter::new(config.ui.notice_capacity, config.ui.show_network_errors);
        let (tx, rx) = mpsc::channel(100);

        Self {
            config,
            view: View::Dashboard,
            focus: Focus::Datasets,
            should_quit: false,
            dataset_cursor: 0,
            suggestion_cursor: 0,
            alert: None,
            status: None,
            datasets_loading: false,
            spinner_frame: 0,
            workflow: Workflow::new(reporter),
            api,
            event_rx: rx,
            event_tx: tx,
        }
    }

    /// Fetch the dataset list once at startup
    pub fn start(&mut self) {
        self.datasets_loading = true;
        let api = self.api.clone();
        let tx = self.event_tx.clone();
        tokio::spawn(async move {
            let result = api.list_datasets().await;
            tx.send(AppEvent::DatasetsLoaded(result)).await.ok();
        });
    }

    /// Poll for async events
    pub fn poll_events(&mut self) {
        while let Ok(event) = self.event_rx.try_recv() {
            self.handle_event(event);
        }
    }

    /// Apply a backend response
    pub fn handle_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::DatasetsLoaded(result) => {
                self.datasets_loading = false;
                self.workflow.apply_datasets(result);
                self.dataset_cursor = 0;
            }
            AppEvent::SuggestionsLoaded { tag, result } => {
                if self.workflow.apply_suggestions(tag, result) == Applied::Current {
                    self.suggestion_cursor = 0;
                }
            }
            AppEvent::AnalysisLoaded { tag, result } => {
                self.workflow.apply_analysis(tag, result);
            }
            AppEvent::ExportFinished { path, result } => match result {
                Ok(()) => {
                    info!(path = %path.display(), "Chart exported");
                    self.status = Some(format!("Saved {}", path.display()));
                }
                Err(e) => {
                    error!(path = %path.display(), error = %e, "Chart export failed");
                    self.status = Some(format!("Export failed: {}", e));
                }
            },
        }
    }

    /// Handle a user action
    pub fn handle_action(&mut self, action: AppAction) {
        if action == AppAction::Tick {
            if self.workflow.is_loading() || self.datasets_loading {
                self.spinner_frame = self.spinner_frame.wrapping_add(1);
            }
            return;
        }

        if action == AppAction::ForceQuit {
            self.should_quit = true;
            return;
        }

        // Overlays swallow the key that closes them
        if self.alert.take().is_some() {
            return;
        }
        if self.view == View::Help {
            self.view = View::Dashboard;
            return;
        }

        match action {
            AppAction::Quit => self.should_quit = true,
            AppAction::ToggleHelp => self.view = View::Help,
            AppAction::Up => self.move_cursor(-1),
            AppAction::Down => self.move_cursor(1),
            AppAction::NextPane | AppAction::PrevPane => self.toggle_focus(),
            AppAction::Select => match self.focus {
                Focus::Datasets => self.select_dataset(),
                Focus::Suggestions => self.select_suggestion(),
            },
            AppAction::Export => self.export_chart(),
            AppAction::Escape => self.status = None,
            AppAction::Other | AppAction::Tick | AppAction::ForceQuit => {}
        }
    }

    /// Suggestions of the selected dataset, empty while loading
    pub fn suggestions(&self) -> &[Suggestion] {
        self.workflow
            .state()
            .session()
            .map(|s| s.suggestions())
            .unwrap_or(&[])
    }

    fn move_cursor(&mut self, delta: isize) {
        let (cursor, len) = match self.focus {
            Focus::Datasets => (&mut self.dataset_cursor, self.workflow.datasets().len()),
            Focus::Suggestions => {
                let len = self
                    .workflow
                    .state()
                    .session()
                    .map_or(0, |s| s.suggestions().len());
                (&mut self.suggestion_cursor, len)
            }
        };
        if len == 0 {
            *cursor = 0;
            return;
        }
        *cursor = cursor.saturating_add_signed(delta).min(len - 1);
    }

    fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            Focus::Datasets if self.workflow.state().session().is_some() => Focus::Suggestions,
            _ => Focus::Datasets,
        };
    }

    fn select_dataset(&mut self) {
        let Some(dataset) = self.workflow.datasets().get(self.dataset_cursor).cloned() else {
            return;
        };

        let ticket = self.workflow.select_dataset(dataset);
        self.suggestion_cursor = 0;
        self.focus = Focus::Suggestions;
        self.status = None;

        let api = self.api.clone();
        let tx = self.event_tx.clone();
        tokio::spawn(async move {
            let result = api.get_suggestions(&ticket.dataset).await;
            tx.send(AppEvent::SuggestionsLoaded {
                tag: ticket.tag,
                result,
            })
            .await
            .ok();
        });
    }

    fn select_suggestion(&mut self) {
        let Some(suggestion) = self.suggestions().get(self.suggestion_cursor).cloned() else {
            return;
        };

        let ticket = match self.workflow.select_suggestion(&suggestion) {
            Ok(ticket) => ticket,
            Err(e @ AppError::NoGroupingColumn { .. }) => {
                warn!(suggestion = %suggestion.id, "{}", e);
                self.alert = Some(e.to_string());
                return;
            }
            Err(e) => {
                warn!(suggestion = %suggestion.id, error = %e, "Cannot start analysis");
                return;
            }
        };

        let api = self.api.clone();
        let tx = self.event_tx.clone();
        tokio::spawn(async move {
            let result = api.analyze(&ticket.dataset, &ticket.request).await;
            tx.send(AppEvent::AnalysisLoaded {
                tag: ticket.tag,
                result,
            })
            .await
            .ok();
        });
    }

    /// Path the current chart is exported to
    pub fn export_path(&self) -> Option<PathBuf> {
        let state = self.workflow.state();
        let dataset = state.selected_dataset()?;
        let suggestion = state.active_suggestion()?;
        state.chart()?;
        Some(
            self.config
                .export
                .dir
                .join(export_file_name(dataset, &suggestion.id)),
        )
    }

    /// Render the chart to PNG off the UI task
    fn export_chart(&mut self) {
        let (Some(chart), Some(path)) = (self.workflow.state().chart().cloned(), self.export_path())
        else {
            self.status = Some("No chart to export".to_string());
            return;
        };

        self.status = Some(format!("Saving {}...", path.display()));
        let tx = self.event_tx.clone();
        tokio::spawn(async move {
            let target = path.clone();
            let result = tokio::task::spawn_blocking(move || write_png(&chart, &target))
                .await
                .unwrap_or_else(|e| Err(anyhow::anyhow!("export task failed: {}", e)));
            tx.send(AppEvent::ExportFinished { path, result }).await.ok();
        });
    }
}

/// `<dataset>_<suggestion>.png` with path-unsafe characters replaced
pub fn export_file_name(dataset: &DatasetId, suggestion_id: &str) -> String {
    let clean = |s: &str| -> String {
        s.chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect()
    };
    format!("{}_{}.png", clean(dataset.as_str()), clean(suggestion_id))
}
