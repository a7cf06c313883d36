//! UI Rendering
//!
//! Main UI layout and rendering logic for the TUI.

use crate::report::Severity;
use crate::tui::app::{App, Focus, View};
use crate::tui::theme::{Icons, Theme};
use crate::tui::widgets;
use crate::types::{AnalysisKind, ChartKind};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

pub const PLACEHOLDER: &str = "Analysis results will appear here";
pub const LOADING: &str = "Analyzing...";

/// Render the main UI
pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(10),   // Body
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());

    render_header(frame, chunks[0], app);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
        .split(chunks[1]);

    let lists = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(body[0]);

    render_datasets(frame, lists[0], app);
    render_suggestions(frame, lists[1], app);
    render_result(frame, body[1], app);
    render_status_bar(frame, chunks[2], app);

    // Render modal overlays
    if app.view == View::Help {
        render_help(frame);
    }
    if let Some(message) = &app.alert {
        render_alert(frame, message);
    }
}

fn render_header(frame: &mut Frame, area: Rect, app: &App) {
    let title_text = vec![Line::from(vec![
        Span::raw("📊 "),
        Span::styled("Smart Data Visualization", Theme::title()),
        Span::styled("  ", Theme::text_secondary()),
        Span::styled(app.config.api.base_url.clone(), Theme::text_dim()),
    ])];

    let title = Paragraph::new(title_text).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Theme::border()),
    );

    frame.render_widget(title, area);
}

fn list_block(title: &'static str, focused: bool) -> Block<'static> {
    Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(if focused {
            Theme::border_focused()
        } else {
            Theme::border()
        })
}

fn render_datasets(frame: &mut Frame, area: Rect, app: &App) {
    let block = list_block(" Datasets ", app.focus == Focus::Datasets);
    let datasets = app.workflow.datasets();

    if datasets.is_empty() {
        let text = if app.datasets_loading {
            "Loading datasets..."
        } else {
            "No datasets available"
        };
        let paragraph = Paragraph::new(Span::styled(text, Theme::placeholder())).block(block);
        frame.render_widget(paragraph, area);
        return;
    }

    let selected = app.workflow.state().selected_dataset();
    let items: Vec<ListItem> = datasets
        .iter()
        .map(|dataset| {
            let is_selected = selected == Some(dataset);
            let (marker, style) = if is_selected {
                (Icons::SELECTED, Theme::selected())
            } else {
                (" ", Theme::text())
            };
            ListItem::new(Line::from(vec![
                Span::styled(format!("{} ", marker), style),
                Span::styled(dataset.display_label(), style),
            ]))
        })
        .collect();

    let list = List::new(items).block(block).highlight_style(Theme::highlight());
    let mut state = ListState::default().with_selected(Some(app.dataset_cursor));
    frame.render_stateful_widget(list, area, &mut state);
}

fn render_suggestions(frame: &mut Frame, area: Rect, app: &App) {
    let block = list_block(" Suggestions ", app.focus == Focus::Suggestions);

    let Some(session) = app.workflow.state().session() else {
        let paragraph =
            Paragraph::new(Span::styled("Select a dataset first", Theme::placeholder()))
                .block(block);
        frame.render_widget(paragraph, area);
        return;
    };

    let Some(catalog) = &session.catalog else {
        let paragraph = Paragraph::new(Span::styled(
            format!("{} Loading suggestions...", spinner(app)),
            Theme::active(),
        ))
        .block(block);
        frame.render_widget(paragraph, area);
        return;
    };

    if catalog.suggestions.is_empty() {
        let paragraph = Paragraph::new(Span::styled(
            "No suggestions for this dataset",
            Theme::placeholder(),
        ))
        .block(block);
        frame.render_widget(paragraph, area);
        return;
    }

    let active = app.workflow.state().active_suggestion().map(|s| s.id.as_str());
    let items: Vec<ListItem> = catalog
        .suggestions
        .iter()
        .map(|suggestion| {
            let icon = match suggestion.analysis_kind().map(|k| k.expected_chart()) {
                Some(ChartKind::Bar) => Icons::BAR,
                Some(ChartKind::Pie) => Icons::PIE,
                None => Icons::DOT,
            };
            let style = if active == Some(suggestion.id.as_str()) {
                Theme::selected()
            } else {
                Theme::text()
            };
            ListItem::new(Line::from(vec![
                Span::styled(format!("{} ", icon), Theme::text_secondary()),
                Span::styled(suggestion.text.clone(), style),
            ]))
        })
        .collect();

    let list = List::new(items).block(block).highlight_style(Theme::highlight());
    let mut state = ListState::default().with_selected(Some(app.suggestion_cursor));
    frame.render_stateful_widget(list, area, &mut state);
}

fn render_result(frame: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .title(" Result ")
        .borders(Borders::ALL)
        .border_style(Theme::border());
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let state = app.workflow.state();
    let chart = state.chart();
    let loading = app.workflow.is_loading();

    let chart_area = if loading {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Min(0)])
            .split(inner);
        let line = Line::from(vec![
            Span::styled(format!("{} ", spinner(app)), Theme::active()),
            Span::styled(LOADING, Theme::active()),
        ]);
        frame.render_widget(Paragraph::new(line).alignment(Alignment::Center), chunks[0]);
        chunks[1]
    } else {
        inner
    };

    match chart {
        Some(spec) => widgets::render_chart(frame, chart_area, spec),
        None if !loading => {
            let placeholder = Paragraph::new(Span::styled(PLACEHOLDER, Theme::placeholder()))
                .alignment(Alignment::Center)
                .wrap(Wrap { trim: true });
            frame.render_widget(placeholder, centered_rect(80, 20, chart_area));
        }
        None => {}
    }
}

fn render_status_bar(frame: &mut Frame, area: Rect, app: &App) {
    let state = app.workflow.state();
    let status = if let Some(notice) = app.workflow.reporter().visible() {
        let style = match notice.severity {
            Severity::Error => Theme::error(),
            Severity::Warning => Theme::warning(),
        };
        Span::styled(
            format!("{} {}", notice.timestamp.format("%H:%M:%S"), notice.message),
            style,
        )
    } else if let Some(message) = &app.status {
        Span::styled(message.clone(), Theme::success())
    } else if state.is_loading() {
        Span::styled(format!("{} Loading", spinner(app)), Theme::active())
    } else {
        let kind = state
            .active_suggestion()
            .and_then(|s| s.analysis_kind())
            .map(describe_kind);
        match kind {
            Some(kind) => Span::styled(kind, Theme::text_secondary()),
            None => Span::styled("Ready", Theme::text_secondary()),
        }
    };

    let shortcuts = vec![
        Span::styled(" [Enter]", Theme::shortcut_key()),
        Span::styled(" Select ", Theme::shortcut_desc()),
        Span::styled("[Tab]", Theme::shortcut_key()),
        Span::styled(" Switch list ", Theme::shortcut_desc()),
        Span::styled("[s]", Theme::shortcut_key()),
        Span::styled(" Save PNG ", Theme::shortcut_desc()),
        Span::styled("[q]", Theme::shortcut_key()),
        Span::styled(" Quit ", Theme::shortcut_desc()),
        Span::styled("[?]", Theme::shortcut_key()),
        Span::styled(" Help", Theme::shortcut_desc()),
    ];

    let line = Line::from(
        std::iter::once(status)
            .chain(std::iter::once(Span::raw(" │ ")))
            .chain(shortcuts)
            .collect::<Vec<_>>(),
    );

    frame.render_widget(Paragraph::new(line), area);
}

fn describe_kind(kind: AnalysisKind) -> &'static str {
    match kind {
        AnalysisKind::GroupSum => "Sum per group",
        AnalysisKind::GroupAvg => "Average per group",
        AnalysisKind::ValueCounts => "Value counts",
    }
}

fn spinner(app: &App) -> &'static str {
    Icons::SPINNER[app.spinner_frame % Icons::SPINNER.len()]
}

/// Render the help modal
fn render_help(frame: &mut Frame) {
    let area = centered_rect(60, 60, frame.area());
    frame.render_widget(Clear, area);

    let shortcut = |key: &'static str, desc: &'static str| {
        Line::from(vec![
            Span::styled(format!("{:<13}", key), Theme::shortcut_key()),
            Span::styled(desc, Theme::text()),
        ])
    };

    let help_lines = vec![
        Line::from(Span::styled("Keyboard Shortcuts", Theme::heading())),
        Line::from(""),
        shortcut("↑/↓ j/k", "Move in the focused list"),
        shortcut("Enter", "Select dataset / run suggestion"),
        shortcut("Tab", "Switch between datasets and suggestions"),
        shortcut("s", "Save the chart as PNG"),
        shortcut("Esc", "Clear the status message"),
        shortcut("q", "Quit application"),
        shortcut("Ctrl+C", "Force quit"),
        shortcut("F1 / ?", "Show this help"),
        Line::from(""),
        Line::from(Span::styled("Press any key to close", Theme::text_dim())),
    ];

    let paragraph = Paragraph::new(help_lines).block(
        Block::default()
            .title(" Help ")
            .borders(Borders::ALL)
            .border_style(Theme::border_focused()),
    );

    frame.render_widget(paragraph, area);
}

fn render_alert(frame: &mut Frame, message: &str) {
    let area = centered_rect(50, 30, frame.area());
    frame.render_widget(Clear, area);

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(message.to_string(), Theme::text())),
        Line::from(""),
        Line::from(Span::styled("Press any key to continue", Theme::text_dim())),
    ];

    let paragraph = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .title(" Cannot run analysis ")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Theme::ERROR)),
        );

    frame.render_widget(paragraph, area);
}

/// Helper to create a centered rect
pub fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
