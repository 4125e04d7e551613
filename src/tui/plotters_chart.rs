//! Plotters-powered chart widgets for Ratatui.
//!
//! We render Plotters output into the Ratatui buffer using `plotters-ratatui-backend`.
//! Both widgets are data-driven: series and bounds are computed outside the
//! render call, which keeps `render()` focused on drawing.

use plotters::prelude::*;
use plotters_ratatui_backend::widget_fn;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color as TuiColor, Style},
    widgets::Widget,
};

use crate::cluster::{ClusterBounds, StoreGroup};
use crate::domain::{CategoryCode, Store};
use crate::forecast::{ChartSeries, SeriesKind};

pub fn series_color(kind: SeriesKind) -> RGBColor {
    match kind {
        SeriesKind::Actual => RGBColor(255, 99, 132),
        SeriesKind::Predicted => RGBColor(75, 192, 192),
        SeriesKind::Lower => RGBColor(255, 206, 86),
        SeriesKind::Upper => RGBColor(54, 162, 235),
    }
}

pub fn store_color(store: Option<Store>) -> RGBColor {
    match store {
        Some(Store::S001) => RGBColor(255, 87, 51),
        Some(Store::S002) => RGBColor(51, 255, 87),
        Some(Store::S003) => RGBColor(51, 87, 255),
        Some(Store::S004) => RGBColor(243, 195, 0),
        Some(Store::S005) => RGBColor(135, 95, 154),
        None => WHITE,
    }
}

const CLUSTER_BAND_COLORS: [RGBColor; 5] = [
    RGBColor(128, 64, 48),
    RGBColor(48, 128, 64),
    RGBColor(48, 64, 128),
    RGBColor(120, 100, 16),
    RGBColor(90, 64, 100),
];

/// Split a dataset into contiguous `(x, y)` runs, breaking at missing values.
pub fn segments(values: &[Option<f64>]) -> Vec<Vec<(f64, f64)>> {
    let mut out = Vec::new();
    let mut current = Vec::new();
    for (i, v) in values.iter().enumerate() {
        match v {
            Some(y) => current.push((i as f64, *y)),
            None if !current.is_empty() => out.push(std::mem::take(&mut current)),
            None => {}
        }
    }
    if !current.is_empty() {
        out.push(current);
    }
    out
}

/// Forecast line chart. x is the label position; labels map positions to dates.
pub struct ForecastPlottersChart<'a> {
    pub chart: &'a ChartSeries,
    pub x_bounds: [f64; 2],
    pub y_bounds: [f64; 2],
}

impl<'a> Widget for ForecastPlottersChart<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if !fits(area, buf) || !valid_bounds(self.x_bounds, self.y_bounds) {
            return;
        }
        let [x0, x1] = self.x_bounds;
        let [y0, y1] = self.y_bounds;
        let labels = &self.chart.labels;

        let widget = widget_fn(move |root| {
            let mut chart = ChartBuilder::on(&root)
                .margin(1)
                .set_label_area_size(LabelAreaPosition::Left, 6)
                .set_label_area_size(LabelAreaPosition::Bottom, 3)
                .build_cartesian_2d(x0..x1, y0..y1)?;

            chart
                .configure_mesh()
                .disable_x_mesh()
                .disable_y_mesh()
                .x_desc("date")
                .y_desc("sales")
                .x_labels(5)
                .y_labels(5)
                .x_label_formatter(&|v| label_at(labels, *v))
                .y_label_formatter(&|v| format!("{v:.0}"))
                .label_style(("sans-serif", 10).into_font().color(&WHITE))
                .axis_style(&WHITE)
                .bold_line_style(&WHITE)
                .draw()?;

            // Bands first, then predicted, then actual on top.
            for kind in [SeriesKind::Upper, SeriesKind::Lower, SeriesKind::Predicted] {
                let Some(ds) = self.chart.dataset(kind) else {
                    continue;
                };
                let color = series_color(kind);
                for run in segments(&ds.values) {
                    chart.draw_series(LineSeries::new(run, &color))?;
                }
            }

            if let Some(actual) = self.chart.dataset(SeriesKind::Actual) {
                let color = series_color(SeriesKind::Actual);
                for run in segments(&actual.values) {
                    chart.draw_series(run.iter().map(|&(x, y)| Pixel::new((x, y), color)))?;
                    if run.len() > 1 {
                        chart.draw_series(LineSeries::new(run, &color))?;
                    }
                }
            }

            Ok(())
        });

        widget.render(area, buf);
    }
}

/// Cluster scatter: x = sales, y = category code, one color per store,
/// one outlined band per cluster's sales span.
pub struct ClusterPlottersChart<'a> {
    pub groups: &'a [StoreGroup],
    pub bounds: &'a [ClusterBounds],
    pub x_bounds: [f64; 2],
    pub y_bounds: [f64; 2],
}

impl<'a> Widget for ClusterPlottersChart<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if !fits(area, buf) || !valid_bounds(self.x_bounds, self.y_bounds) {
            return;
        }
        let [x0, x1] = self.x_bounds;
        let [y0, y1] = self.y_bounds;

        let widget = widget_fn(move |root| {
            let mut chart = ChartBuilder::on(&root)
                .margin(1)
                .set_label_area_size(LabelAreaPosition::Left, 14)
                .set_label_area_size(LabelAreaPosition::Bottom, 3)
                .build_cartesian_2d(x0..x1, y0..y1)?;

            chart
                .configure_mesh()
                .disable_x_mesh()
                .disable_y_mesh()
                .x_desc("Sales (EWMA)")
                .y_desc("Category")
                .x_labels(5)
                .y_labels(((y1 - y0).round() as usize).max(2))
                .x_label_formatter(&|v| format!("{v:.0}"))
                .y_label_formatter(&|v| category_tick(*v))
                .label_style(("sans-serif", 10).into_font().color(&WHITE))
                .axis_style(&WHITE)
                .bold_line_style(&WHITE)
                .draw()?;

            for (i, b) in self.bounds.iter().enumerate() {
                let color = CLUSTER_BAND_COLORS[i % CLUSTER_BAND_COLORS.len()];
                chart.draw_series(std::iter::once(Rectangle::new(
                    [(b.min_sales, y0), (b.max_sales, y1)],
                    &color,
                )))?;
            }

            for group in self.groups {
                let color = store_color(group.store.store());
                chart.draw_series(
                    group
                        .points
                        .iter()
                        .map(|p| Pixel::new((p.sales, p.category.0 as f64), color)),
                )?;
            }

            Ok(())
        });

        widget.render(area, buf);
    }
}

fn fits(area: Rect, buf: &mut Buffer) -> bool {
    // When the available area is too small, Plotters may fail to build a chart.
    // In that case, we render a small hint rather than panicking.
    if area.width < 20 || area.height < 8 {
        buf.set_string(
            area.x,
            area.y,
            "Chart area too small (resize terminal).",
            Style::default().fg(TuiColor::Yellow),
        );
        return false;
    }
    true
}

fn valid_bounds(x: [f64; 2], y: [f64; 2]) -> bool {
    x.iter().chain(y.iter()).all(|v| v.is_finite()) && x[1] > x[0] && y[1] > y[0]
}

/// Date for the label nearest to position `v`, blank off the grid.
pub fn label_at(labels: &[chrono::NaiveDate], v: f64) -> String {
    let i = v.round();
    if i < 0.0 || (v - i).abs() > 0.25 {
        return String::new();
    }
    labels
        .get(i as usize)
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

/// Category name for integer ticks, blank between them.
pub fn category_tick(v: f64) -> String {
    let i = v.round();
    if (v - i).abs() > 0.05 {
        return String::new();
    }
    CategoryCode(i as i64).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn segments_break_on_missing_values() {
        let runs = segments(&[Some(1.0), Some(2.0), None, None, Some(5.0), None]);
        assert_eq!(runs, vec![vec![(0.0, 1.0), (1.0, 2.0)], vec![(4.0, 5.0)]]);
        assert!(segments(&[None, None]).is_empty());
    }

    #[test]
    fn label_lookup_is_positional() {
        let labels = vec![
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 8).unwrap(),
        ];
        assert_eq!(label_at(&labels, 1.0), "2024-01-08");
        assert_eq!(label_at(&labels, 0.5), "");
        assert_eq!(label_at(&labels, 7.0), "");
        assert_eq!(label_at(&labels, -1.0), "");
    }

    #[test]
    fn category_ticks_use_fallback_labels() {
        assert_eq!(category_tick(1.0), "Breaks");
        assert_eq!(category_tick(6.0), "Unknown (6)");
        assert_eq!(category_tick(1.5), "");
    }
}
