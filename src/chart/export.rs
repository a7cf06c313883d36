use std::path::Path;

use anyhow::{Context, Result};
use plotters::prelude::*;

use crate::chart::{format_value, palette_color, slices, ChartSpec, HexColor, Slice};
use crate::types::ChartKind;

const WIDTH: u32 = 900;
const HEIGHT: u32 = 560;

impl From<HexColor> for RGBColor {
    fn from(c: HexColor) -> Self {
        RGBColor(c.r, c.g, c.b)
    }
}

/// Write `spec` as a PNG image at `output_path`
pub fn write_png(spec: &ChartSpec, output_path: &Path) -> Result<()> {
    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }

    match spec.kind {
        ChartKind::Bar => write_bar_chart(spec, output_path),
        ChartKind::Pie => write_pie_chart(spec, output_path),
    }
    .with_context(|| format!("Failed to write chart to {}", output_path.display()))
}

fn write_bar_chart(spec: &ChartSpec, output_path: &Path) -> Result<()> {
    let categories: Vec<(&str, f64, HexColor)> = spec.categories().collect();
    let count = categories.len().max(1);

    let y_min = categories.iter().map(|c| c.1).fold(0f64, f64::min);
    let mut y_max = categories.iter().map(|c| c.1).fold(0f64, f64::max);
    if y_max <= y_min {
        y_max = y_min + 1.0;
    }
    let headroom = (y_max - y_min) * 0.05;

    let root = BitMapBackend::new(output_path, (WIDTH, HEIGHT)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .margin(20)
        .caption(&spec.title, ("sans-serif", 24))
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(0f64..count as f64, y_min..y_max + headroom)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(count)
        .x_label_formatter(&|x| {
            let idx = (*x).floor() as usize;
            categories
                .get(idx)
                .map(|c| c.0.to_string())
                .unwrap_or_default()
        })
        .draw()?;

    let border: RGBColor = spec.series.border_color.into();
    let border_width = spec.series.border_width;

    for (idx, (_, value, color)) in categories.iter().enumerate() {
        let idx_f = idx as f64;
        let corners = [(idx_f + 0.1, 0.0), (idx_f + 0.9, *value)];
        let fill: RGBColor = (*color).into();
        chart.draw_series(std::iter::once(Rectangle::new(corners, fill.filled())))?;
        chart.draw_series(std::iter::once(Rectangle::new(
            corners,
            border.stroke_width(border_width),
        )))?;
    }

    root.present()?;
    Ok(())
}

fn write_pie_chart(spec: &ChartSpec, output_path: &Path) -> Result<()> {
    let root = BitMapBackend::new(output_path, (WIDTH, HEIGHT)).into_drawing_area();
    root.fill(&WHITE)?;
    let area = root.titled(&spec.title, ("sans-serif", 24))?;

    let (width, height) = area.dim_in_pixel();
    let radius = (f64::from(height.min(width / 2)) / 2.0 - 20.0).max(10.0);
    let center = (f64::from(width) / 3.0, f64::from(height) / 2.0);

    let border: RGBColor = spec.series.border_color.into();
    for slice in slices(&spec.series.data) {
        let points = slice_polygon(center, radius, &slice);
        let fill: RGBColor = spec
            .series
            .background_colors
            .get(slice.index)
            .copied()
            .unwrap_or_else(|| palette_color(slice.index))
            .into();
        area.draw(&Polygon::new(points.clone(), fill.filled()))?;
        let mut outline = points;
        if let Some(first) = outline.first().copied() {
            outline.push(first);
        }
        area.draw(&PathElement::new(
            outline,
            border.stroke_width(spec.series.border_width),
        ))?;
    }

    let legend_x = (f64::from(width) * 0.62) as i32;
    let legend_font = ("sans-serif", 16).into_font();
    for (row, (label, value, color)) in spec.categories().enumerate() {
        let y = 30 + row as i32 * 24;
        let fill: RGBColor = color.into();
        area.draw(&Rectangle::new(
            [(legend_x, y), (legend_x + 14, y + 14)],
            fill.filled(),
        ))?;
        area.draw(&Text::new(
            format!("{} ({})", label, format_value(value)),
            (legend_x + 22, y),
            legend_font.clone(),
        ))?;
    }

    root.present()?;
    Ok(())
}

/// Pixel outline of a slice: the center followed by points along its arc
fn slice_polygon(center: (f64, f64), radius: f64, slice: &Slice) -> Vec<(i32, i32)> {
    let steps = ((slice.sweep / std::f64::consts::TAU) * 120.0).ceil().max(2.0) as usize;
    let mut points = Vec::with_capacity(steps + 2);
    points.push((center.0.round() as i32, center.1.round() as i32));
    for step in 0..=steps {
        let angle = slice.start + slice.sweep * step as f64 / steps as f64;
        // Screen y grows downwards, angles run clockwise from 12 o'clock
        let x = center.0 + radius * angle.sin();
        let y = center.1 - radius * angle.cos();
        points.push((x.round() as i32, y.round() as i32));
    }
    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::to_chart_spec;
    use crate::types::AnalysisResult;

    fn spec(chart_type: &str, labels: &[&str], data: &[f64]) -> ChartSpec {
        to_chart_spec(&AnalysisResult {
            chart_type: chart_type.to_string(),
            title: "Analysis of 'price' by 'city'".to_string(),
            labels: labels.iter().map(|l| l.to_string()).collect(),
            data: data.to_vec(),
        })
        .unwrap()
    }

    fn assert_written(path: &Path) {
        let meta = std::fs::metadata(path).unwrap();
        assert!(meta.len() > 0, "{} is empty", path.display());
    }

    #[test]
    fn test_write_bar_png_with_negative_value() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/out/bar.png");
        let chart = spec("bar", &["Hanoi", "Hue", "Vinh"], &[3.0, -2.0, 5.5]);

        write_png(&chart, &path).unwrap();
        assert_written(&path);
    }

    #[test]
    fn test_write_empty_bar_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.png");

        write_png(&spec("bar", &[], &[]), &path).unwrap();
        assert_written(&path);
    }

    #[test]
    fn test_write_pie_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pie.png");
        let chart = spec("pie", &["Hanoi", "Hue", "Vinh"], &[1.0, 2.0, 3.0]);

        write_png(&chart, &path).unwrap();
        assert_written(&path);
    }

    #[test]
    fn test_write_all_zero_pie_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("zero.png");
        let chart = spec("pie", &["Hanoi", "Hue"], &[0.0, 0.0]);

        write_png(&chart, &path).unwrap();
        assert_written(&path);
    }

    #[test]
    fn test_half_slice_polygon_spans_top_to_bottom() {
        let slice = Slice {
            index: 0,
            fraction: 0.5,
            start: 0.0,
            sweep: std::f64::consts::PI,
        };
        let points = slice_polygon((100.0, 100.0), 50.0, &slice);
        assert_eq!(points[0], (100, 100));
        assert_eq!(points[1], (100, 50));
        assert_eq!(*points.last().unwrap(), (100, 150));
        // Clockwise from the top passes through the right-hand side
        assert!(points.iter().any(|&(x, y)| x == 150 && y == 100));
    }

    #[test]
    fn test_small_slice_has_arc_points() {
        let slice = Slice {
            index: 2,
            fraction: 0.01,
            start: 1.0,
            sweep: 0.01,
        };
        assert!(slice_polygon((0.0, 0.0), 10.0, &slice).len() >= 4);
    }
}
