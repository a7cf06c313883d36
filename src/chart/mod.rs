//! Chart Adapter
//!
//! Turns an analysis response into a render-ready [`ChartSpec`]. The terminal
//! view and the PNG exporter both draw from the same spec.

pub mod export;

use crate::types::{AnalysisResult, AppError, AppResult, ChartKind};
use serde::Serialize;
use std::f64::consts::TAU;

/// An RGB color written as `#rrggbb`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HexColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl HexColor {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl std::fmt::Display for HexColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Category fill colors, assigned by position modulo the palette length
pub const PALETTE: [HexColor; 6] = [
    HexColor::rgb(0x34, 0xD3, 0x99),
    HexColor::rgb(0xF8, 0x71, 0x71),
    HexColor::rgb(0x60, 0xA5, 0xFA),
    HexColor::rgb(0xFB, 0xBF, 0x24),
    HexColor::rgb(0xA7, 0x8B, 0xFA),
    HexColor::rgb(0xF4, 0x72, 0xB6),
];

pub const BORDER_COLOR: HexColor = HexColor::rgb(0x1f, 0x29, 0x37);

pub const BORDER_WIDTH: u32 = 1;

/// Fill color for the category at `index`
pub fn palette_color(index: usize) -> HexColor {
    PALETTE[index % PALETTE.len()]
}

/// The single data series of a chart
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub data: Vec<f64>,
    pub background_colors: Vec<HexColor>,
    /// Applies to the whole series, not per category
    pub border_color: HexColor,
    pub border_width: u32,
}

/// Render-ready description of a chart
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    pub kind: ChartKind,
    pub title: String,
    pub labels: Vec<String>,
    pub series: Series,
}

impl ChartSpec {
    /// Categories as `(label, value, color)`; stops at the shorter of labels/data
    pub fn categories(&self) -> impl Iterator<Item = (&str, f64, HexColor)> + '_ {
        self.labels
            .iter()
            .zip(self.series.data.iter())
            .zip(self.series.background_colors.iter())
            .map(|((label, value), color)| (label.as_str(), *value, *color))
    }
}

/// Map an analysis response to a chart.
///
/// Pure: the same input always produces the same spec.
pub fn to_chart_spec(result: &AnalysisResult) -> AppResult<ChartSpec> {
    let kind = match result.chart_type.as_str() {
        "bar" => ChartKind::Bar,
        "pie" => ChartKind::Pie,
        other => return Err(AppError::UnsupportedChartKind(other.to_string())),
    };

    let background_colors = (0..result.data.len()).map(palette_color).collect();

    Ok(ChartSpec {
        kind,
        title: result.title.clone(),
        labels: result.labels.clone(),
        series: Series {
            data: result.data.clone(),
            background_colors,
            border_color: BORDER_COLOR,
            border_width: BORDER_WIDTH,
        },
    })
}

/// One pie slice, angles in radians measured clockwise from 12 o'clock
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Slice {
    pub index: usize,
    pub fraction: f64,
    pub start: f64,
    pub sweep: f64,
}

impl Slice {
    pub fn end(&self) -> f64 {
        self.start + self.sweep
    }

    pub fn contains(&self, angle: f64) -> bool {
        angle >= self.start && angle < self.end()
    }
}

/// Split a full turn between the positive values of `data`.
///
/// Zero, negative and non-finite values get no slice. Returns an empty list
/// when nothing is positive.
pub fn slices(data: &[f64]) -> Vec<Slice> {
    let weight = |v: f64| if v.is_finite() && v > 0.0 { v } else { 0.0 };
    let total: f64 = data.iter().copied().map(weight).sum();
    if total <= 0.0 {
        return Vec::new();
    }

    let mut start = 0.0;
    let mut out = Vec::new();
    for (index, value) in data.iter().copied().enumerate() {
        let value = weight(value);
        if value == 0.0 {
            continue;
        }
        let fraction = value / total;
        let sweep = fraction * TAU;
        out.push(Slice {
            index,
            fraction,
            start,
            sweep,
        });
        start += sweep;
    }
    out
}

/// Angle of `(x, y)` around the origin, clockwise from the positive y axis, in `[0, TAU)`
pub fn clockwise_angle(x: f64, y: f64) -> f64 {
    let angle = x.atan2(y);
    if angle < 0.0 {
        angle + TAU
    } else {
        angle
    }
}

/// Format a chart value without trailing zeros
pub fn format_value(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        let s = format!("{:.2}", value);
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}
