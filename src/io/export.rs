//! Export the displayed forecast to CSV or JSON.
//!
//! The CSV is meant to be easy to consume in spreadsheets: one row per chart
//! label, empty cells for missing or hidden values.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use serde::Serialize;

use crate::domain::DisplayConfig;
use crate::error::AppError;
use crate::forecast::{ChartSeries, ForecastView, SeriesKind};
use crate::nav::Selection;

const CSV_COLUMNS: [SeriesKind; 4] = [
    SeriesKind::Actual,
    SeriesKind::Predicted,
    SeriesKind::Lower,
    SeriesKind::Upper,
];

/// Write the chart series to a CSV file.
pub fn write_series_csv(path: &Path, chart: &ChartSeries) -> Result<(), AppError> {
    let mut file = File::create(path)
        .map_err(|e| AppError::usage(format!("Failed to create export CSV '{}': {e}", path.display())))?;
    write_series_csv_to(&mut file, chart)
        .map_err(|e| AppError::usage(format!("Failed to write export CSV: {e}")))
}

fn write_series_csv_to<W: Write>(out: &mut W, chart: &ChartSeries) -> std::io::Result<()> {
    writeln!(out, "date,actual,predicted,lower_bound,upper_bound")?;

    let columns: Vec<Option<&Vec<Option<f64>>>> = CSV_COLUMNS
        .iter()
        .map(|&kind| chart.dataset(kind).map(|d| &d.values))
        .collect();

    for (i, label) in chart.labels.iter().enumerate() {
        let cells: Vec<String> = columns
            .iter()
            .map(|col| {
                col.and_then(|values| values[i])
                    .map(|v| format!("{v:.4}"))
                    .unwrap_or_default()
            })
            .collect();
        writeln!(out, "{},{}", label.format("%Y-%m-%d"), cells.join(","))?;
    }

    Ok(())
}

#[derive(Debug, Serialize)]
struct ViewExport<'a> {
    tool: &'static str,
    location: String,
    display: &'a DisplayConfig,
    view: &'a ForecastView,
}

/// Write the selection, display options and derived view to a JSON file.
pub fn write_view_json(
    path: &Path,
    selection: &Selection,
    display: &DisplayConfig,
    view: &ForecastView,
) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::usage(format!("Failed to create view JSON '{}': {e}", path.display())))?;

    let export = ViewExport {
        tool: "mecha",
        location: selection.to_location(),
        display,
        view,
    };

    serde_json::to_writer_pretty(file, &export)
        .map_err(|e| AppError::usage(format!("Failed to write view JSON: {e}")))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    use crate::forecast::Dataset;

    #[test]
    fn csv_leaves_missing_and_hidden_cells_empty() {
        let chart = ChartSeries {
            labels: vec![
                NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2024, 1, 8).unwrap(),
            ],
            datasets: vec![
                Dataset { kind: SeriesKind::Actual, values: vec![None, Some(2.0)] },
                Dataset { kind: SeriesKind::Upper, values: vec![Some(5.5), Some(6.0)] },
            ],
        };
        let mut buf = Vec::new();
        write_series_csv_to(&mut buf, &chart).unwrap();
        let txt = String::from_utf8(buf).unwrap();
        assert_eq!(
            txt,
            concat!(
                "date,actual,predicted,lower_bound,upper_bound\n",
                "2024-01-01,,,,5.5000\n",
                "2024-01-08,2.0000,,,6.0000\n",
            )
        );
    }
}
