//! Error Reporting
//!
//! Every failure the dashboard swallows goes through [`Reporter::report`]: it is
//! logged as a structured `tracing` event and kept as a [`Notice`] that the UI
//! may show without interrupting the user.

use crate::types::AppError;
use chrono::{DateTime, Utc};
use std::collections::VecDeque;
use tracing::{error, warn};

/// How a notice should be treated by the UI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

/// A reported failure
#[derive(Debug, Clone)]
pub struct Notice {
    pub severity: Severity,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// Structured sink for failures
#[derive(Debug)]
pub struct Reporter {
    notices: VecDeque<Notice>,
    capacity: usize,
    surface: bool,
}

impl Reporter {
    /// `surface` controls whether [`Reporter::visible`] exposes notices to the UI
    pub fn new(capacity: usize, surface: bool) -> Self {
        Self {
            notices: VecDeque::with_capacity(capacity.min(64)),
            capacity: capacity.max(1),
            surface,
        }
    }

    pub fn report(&mut self, err: &AppError) {
        let severity = match err {
            AppError::NetworkFailure { operation, message } => {
                error!(operation = %operation, error = %message, "Backend request failed");
                Severity::Error
            }
            AppError::UnsupportedChartKind(kind) => {
                warn!(chart_type = %kind, "Analysis returned a chart type that cannot be drawn");
                Severity::Warning
            }
            other => {
                warn!(error = %other, "Workflow error");
                Severity::Warning
            }
        };

        if self.notices.len() == self.capacity {
            self.notices.pop_front();
        }
        self.notices.push_back(Notice {
            severity,
            message: err.to_string(),
            timestamp: Utc::now(),
        });
    }

    pub fn notices(&self) -> impl Iterator<Item = &Notice> {
        self.notices.iter()
    }

    pub fn latest(&self) -> Option<&Notice> {
        self.notices.back()
    }

    /// Latest notice, if notices are surfaced to the user
    pub fn visible(&self) -> Option<&Notice> {
        if self.surface {
            self.latest()
        } else {
            None
        }
    }
}

impl Default for Reporter {
    fn default() -> Self {
        Self::new(20, false)
    }
}
