//! ASCII plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Plot elements:
//! - actual sales: `o` markers
//! - predicted sales: `-` line
//! - minimum / maximum required units: `v` / `^` lines
//!
//! Missing values break a line rather than being bridged.

use crate::forecast::{ChartSeries, SeriesKind};

fn glyph(kind: SeriesKind) -> char {
    match kind {
        SeriesKind::Actual => 'o',
        SeriesKind::Predicted => '-',
        SeriesKind::Lower => 'v',
        SeriesKind::Upper => '^',
    }
}

/// Render the chart series. The x axis is the label position.
pub fn render_ascii_plot(chart: &ChartSeries, width: usize, height: usize) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let (Some(first), Some(last)) = (chart.labels.first(), chart.labels.last()) else {
        return "Plot: no data\n".to_string();
    };

    let x_max = (chart.len().saturating_sub(1)).max(1) as f64;
    let (y_min, y_max) = y_range(chart).unwrap_or((0.0, 1.0));
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];

    // Lines first (so markers can overlay), widest band first.
    for kind in [SeriesKind::Upper, SeriesKind::Lower, SeriesKind::Predicted] {
        if let Some(ds) = chart.dataset(kind) {
            draw_curve(&mut grid, &ds.values, x_max, y_min, y_max, glyph(kind));
        }
    }

    if let Some(actual) = chart.dataset(SeriesKind::Actual) {
        for (i, v) in actual.values.iter().enumerate() {
            if let Some(v) = v {
                let x = map_x(i as f64, x_max, width);
                let y = map_y(*v, y_min, y_max, height);
                grid[y][x] = glyph(SeriesKind::Actual);
            }
        }
    }

    let mut out = String::new();
    out.push_str(&format!(
        "Plot: dates=[{first}, {last}] | sales=[{y_min:.2}, {y_max:.2}]\n"
    ));
    let legend: Vec<String> = chart
        .datasets
        .iter()
        .map(|ds| format!("{} {}", glyph(ds.kind), ds.kind.label()))
        .collect();
    out.push_str(&format!("Legend: {}\n", legend.join(" | ")));

    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }

    out
}

fn y_range(chart: &ChartSeries) -> Option<(f64, f64)> {
    let mut min_y = f64::INFINITY;
    let mut max_y = f64::NEG_INFINITY;
    for ds in &chart.datasets {
        for v in ds.values.iter().flatten() {
            min_y = min_y.min(*v);
            max_y = max_y.max(*v);
        }
    }

    if min_y.is_finite() && max_y.is_finite() && max_y > min_y {
        Some((min_y, max_y))
    } else if min_y.is_finite() && max_y.is_finite() {
        // Flat series: give it a unit-high band.
        Some((min_y - 0.5, max_y + 0.5))
    } else {
        None
    }
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(i: f64, x_max: f64, width: usize) -> usize {
    let width = width.max(2);
    let u = (i / x_max).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y=top is max -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

fn draw_curve(grid: &mut [Vec<char>], values: &[Option<f64>], x_max: f64, y_min: f64, y_max: f64, ch: char) {
    let height = grid.len();
    let width = grid[0].len();

    let mut prev = None;
    for (i, v) in values.iter().enumerate() {
        let Some(v) = v else {
            prev = None;
            continue;
        };
        let x = map_x(i as f64, x_max, width);
        let y = map_y(*v, y_min, y_max, height);
        match prev {
            Some((x0, y0)) => draw_line(grid, x0, y0, x, y, ch),
            None => {
                if grid[y][x] == ' ' {
                    grid[y][x] = ch;
                }
            }
        }
        prev = Some((x, y));
    }
}

/// Integer line drawing (Bresenham-ish).
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let mut x0 = x0 as isize;
    let mut y0 = y0 as isize;
    let x1 = x1 as isize;
    let y1 = y1 as isize;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if y0 >= 0
            && (y0 as usize) < grid.len()
            && x0 >= 0
            && (x0 as usize) < grid[0].len()
            && grid[y0 as usize][x0 as usize] == ' '
        {
            grid[y0 as usize][x0 as usize] = ch;
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    use crate::forecast::Dataset;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn plot_golden_snapshot_small() {
        let chart = ChartSeries {
            labels: vec![ymd(2024, 1, 1), ymd(2024, 1, 8)],
            datasets: vec![
                Dataset { kind: SeriesKind::Actual, values: vec![Some(100.0), Some(110.0)] },
                Dataset { kind: SeriesKind::Predicted, values: vec![Some(100.0), Some(100.0)] },
            ],
        };

        let txt = render_ascii_plot(&chart, 10, 5);
        let expected = concat!(
            "Plot: dates=[2024-01-01, 2024-01-08] | sales=[99.50, 110.50]\n",
            "Legend: o Actual Sales | - Predicted Sales\n",
            "         o\n",
            "          \n",
            "          \n",
            "          \n",
            "o---------\n",
        );
        assert_eq!(txt, expected);
    }

    #[test]
    fn empty_chart_renders_placeholder() {
        let chart = ChartSeries { labels: vec![], datasets: vec![] };
        assert_eq!(render_ascii_plot(&chart, 20, 5), "Plot: no data\n");
    }

    #[test]
    fn missing_actuals_leave_no_marker() {
        let chart = ChartSeries {
            labels: vec![ymd(2024, 1, 1), ymd(2024, 1, 2), ymd(2024, 1, 3)],
            datasets: vec![Dataset { kind: SeriesKind::Actual, values: vec![None, Some(1.0), None] }],
        };
        let txt = render_ascii_plot(&chart, 11, 5);
        let markers = txt.lines().skip(2).flat_map(|l| l.chars()).filter(|&c| c == 'o').count();
        assert_eq!(markers, 1);
    }
}
