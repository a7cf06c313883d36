// Smartviz - terminal dashboard for server-suggested dataset analyses

pub mod api;
pub mod chart;
pub mod config;
pub mod dashboard;
pub mod report;
pub mod tui;       // Terminal User Interface
pub mod types;
pub mod utils;
pub mod workflow;

// Re-exports for convenience
pub use config::Config;
pub use dashboard::Dashboard;
pub use workflow::{Workflow, WorkflowState};
