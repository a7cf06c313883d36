//! Chart Widget
//!
//! Draws a [`ChartSpec`] in the result panel: a `BarChart` for bar charts and
//! a braille `Canvas` plus legend for pie charts.

use crate::chart::{clockwise_angle, format_value, slices, ChartSpec};
use crate::tui::theme::{Icons, Theme};
use crate::types::ChartKind;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::{
        canvas::{Canvas, Points},
        Bar, BarChart, BarGroup, Paragraph,
    },
    Frame,
};

/// Tallest bar's height; others are scaled relative to it
const BAR_RESOLUTION: f64 = 10_000.0;

/// Widest a single bar gets
const MAX_BAR_WIDTH: usize = 16;

/// Render a chart with its title into `area`
pub fn render_chart(frame: &mut Frame, area: Rect, spec: &ChartSpec) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(2), Constraint::Min(3)])
        .split(area);

    let title = Paragraph::new(Line::from(Span::styled(spec.title.clone(), Theme::heading())))
        .alignment(Alignment::Center);
    frame.render_widget(title, chunks[0]);

    if spec.categories().next().is_none() {
        let empty = Paragraph::new(Span::styled("No data to display", Theme::placeholder()))
            .alignment(Alignment::Center);
        frame.render_widget(empty, chunks[1]);
        return;
    }

    match spec.kind {
        ChartKind::Bar => render_bars(frame, chunks[1], spec),
        ChartKind::Pie => render_pie(frame, chunks[1], spec),
    }
}

fn render_bars(frame: &mut Frame, area: Rect, spec: &ChartSpec) {
    let bar_width = bar_width(area.width, spec.categories().count());
    let heights = bar_heights(&spec.series.data);

    let bars: Vec<Bar> = spec
        .categories()
        .zip(heights)
        .map(|((label, value, color), height)| {
            Bar::default()
                .value(height)
                .text_value(format_value(value))
                .label(Line::from(truncate(label, usize::from(bar_width))))
                .style(Theme::category(color))
                .value_style(Style::default().fg(Color::Black).bg(color.into()))
        })
        .collect();

    let chart = BarChart::default()
        .data(BarGroup::default().bars(&bars))
        .bar_width(bar_width)
        .bar_gap(1);

    frame.render_widget(chart, area);
}

/// Width per bar with a one-cell gap, between 1 and `MAX_BAR_WIDTH`
fn bar_width(area_width: u16, count: usize) -> u16 {
    let per_bar = (usize::from(area_width) + 1) / count.max(1);
    // Clamped to MAX_BAR_WIDTH, so the cast cannot truncate
    per_bar.saturating_sub(1).clamp(1, MAX_BAR_WIDTH) as u16
}

fn render_pie(frame: &mut Frame, area: Rect, spec: &ChartSpec) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(area);
    let canvas_area = chunks[0];

    // Braille cells are 2x4 dots and roughly twice as tall as wide, so dots are square
    let cols = canvas_area.width as usize * 2;
    let rows = canvas_area.height as usize * 4;
    let aspect = if rows == 0 { 1.0 } else { cols as f64 / rows as f64 };
    let (x_radius, y_radius) = if aspect >= 1.0 {
        (aspect, 1.0)
    } else {
        (1.0, 1.0 / aspect)
    };

    let colors: Vec<Color> = spec.series.background_colors.iter().map(|c| (*c).into()).collect();
    let points = pie_points(&spec.series.data, cols, rows, (x_radius, y_radius));

    let canvas = Canvas::default()
        .marker(Marker::Braille)
        .x_bounds([-x_radius, x_radius])
        .y_bounds([-y_radius, y_radius])
        .paint(|ctx| {
            for (index, coords) in &points {
                let color = colors.get(*index).copied().unwrap_or(Theme::ACCENT);
                ctx.draw(&Points {
                    coords: coords.as_slice(),
                    color,
                });
            }
        });
    frame.render_widget(canvas, canvas_area);

    frame.render_widget(Paragraph::new(legend_lines(spec)), chunks[1]);
}

/// Legend rows: swatch, label, value and share of the positive total
pub fn legend_lines(spec: &ChartSpec) -> Vec<Line<'static>> {
    let shares = slices(&spec.series.data);
    spec.categories()
        .enumerate()
        .map(|(index, (label, value, color))| {
            let share = shares
                .iter()
                .find(|s| s.index == index)
                .map_or(0.0, |s| s.fraction);
            Line::from(vec![
                Span::styled(format!("{} ", Icons::SWATCH), Theme::category(color)),
                Span::styled(label.to_string(), Theme::text()),
                Span::styled(format!(" {}", format_value(value)), Theme::text_secondary()),
                Span::styled(format!(" ({:.1}%)", share * 100.0), Theme::text_dim()),
            ])
        })
        .collect()
}

/// Sample a `cols` x `rows` dot grid over `[-rx, rx] x [-ry, ry]` and group
/// the dots inside the unit circle by the slice they fall in.
pub fn pie_points(
    data: &[f64],
    cols: usize,
    rows: usize,
    (x_radius, y_radius): (f64, f64),
) -> Vec<(usize, Vec<(f64, f64)>)> {
    let slices = slices(data);
    let mut grouped: Vec<(usize, Vec<(f64, f64)>)> =
        slices.iter().map(|s| (s.index, Vec::new())).collect();
    if grouped.is_empty() || cols == 0 || rows == 0 {
        return grouped;
    }

    let step_x = 2.0 * x_radius / cols as f64;
    let step_y = 2.0 * y_radius / rows as f64;
    for i in 0..cols {
        let x = -x_radius + (i as f64 + 0.5) * step_x;
        for j in 0..rows {
            let y = -y_radius + (j as f64 + 0.5) * step_y;
            if x * x + y * y > 1.0 {
                continue;
            }
            let angle = clockwise_angle(x, y);
            // Rounding can leave a sliver past the last slice's end
            let slot = slices
                .iter()
                .position(|s| s.contains(angle))
                .unwrap_or(slices.len() - 1);
            grouped[slot].1.push((x, y));
        }
    }
    grouped
}

/// Bar heights relative to the largest positive value, in `0..=BAR_RESOLUTION`.
///
/// `BarChart` multiplies heights by its row ticks, so raw values of large
/// totals would overflow.
fn bar_heights(data: &[f64]) -> Vec<u64> {
    let positive = |v: f64| v.is_finite() && v > 0.0;
    let max = data.iter().copied().filter(|v| positive(*v)).fold(0.0, f64::max);
    data.iter()
        .map(|&v| {
            if positive(v) && max > 0.0 {
                (v / max * BAR_RESOLUTION).round() as u64
            } else {
                0
            }
        })
        .collect()
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        s.chars().take(max_chars).collect()
    }
}
