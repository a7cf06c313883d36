//! TUI Widgets
//!
//! Custom widgets for the dashboard.

mod chart;

pub use chart::{legend_lines, pie_points, render_chart};
