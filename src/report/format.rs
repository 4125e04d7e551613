//! Formatted terminal output for forecasts and clusters.
//!
//! We keep formatting code in one place so:
//! - the transformer and grouping code stay clean and testable
//! - output changes are localized

use crate::cluster::{ClusterBounds, StoreGroup};
use crate::domain::DisplayConfig;
use crate::forecast::{ChartSeries, FutureUnits};
use crate::nav::Selection;

/// The "Forecast Summary" block.
pub fn format_forecast_summary(
    selection: &Selection,
    display: &DisplayConfig,
    units: Option<&FutureUnits>,
) -> String {
    let mut out = String::new();

    out.push_str("=== mecha - Forecast Summary ===\n");
    out.push_str(&format!(
        "Product: {}\n",
        selection.product.map(|p| p.name()).unwrap_or("None")
    ));
    out.push_str(&format!("Store Location: {}\n", selection.store));
    out.push_str(&format!("Start Date: {}\n", selection.range.start));
    out.push_str(&format!("End Date: {}\n", selection.range.end));
    out.push_str(&format!("Forecast Interval: {}\n", display.interval.as_str()));

    let (min, max) = fmt_units(units);
    out.push_str(&format!("Min Required Units: {min} units\n"));
    out.push_str(&format!("Max Required Units: {max} units\n"));

    out
}

/// Rounded min/max strings, `N/A` when not applicable.
pub fn fmt_units(units: Option<&FutureUnits>) -> (String, String) {
    match units.map(FutureUnits::rounded) {
        Some((min, max)) => (min.to_string(), max.to_string()),
        None => ("N/A".to_string(), "N/A".to_string()),
    }
}

/// Tabulate the chart series: one row per label, one column per dataset.
pub fn format_series_table(chart: &ChartSeries) -> String {
    let mut out = String::new();

    out.push_str(&format!("{:<12}", "Date"));
    for ds in &chart.datasets {
        out.push_str(&format!(" {:>24}", ds.kind.label()));
    }
    out.push('\n');

    for (i, label) in chart.labels.iter().enumerate() {
        out.push_str(&format!("{:<12}", label.format("%Y-%m-%d").to_string()));
        for ds in &chart.datasets {
            out.push_str(&format!(" {:>24}", fmt_value(ds.values[i])));
        }
        out.push('\n');
    }

    out
}

/// Two decimals, `N/A` for a missing value.
pub fn fmt_value(value: Option<f64>) -> String {
    value.map(|v| format!("{v:.2}")).unwrap_or_else(|| "N/A".to_string())
}

/// Per-store scatter groups followed by per-cluster sales spans.
pub fn format_cluster_report(groups: &[StoreGroup], bounds: &[ClusterBounds]) -> String {
    let mut out = String::new();

    out.push_str("=== mecha - Cluster Analysis ===\n");
    for group in groups {
        out.push_str(&format!("\nStore {} ({} points):\n", group.store, group.points.len()));
        for p in &group.points {
            out.push_str(&format!("  {:<16} sales={:.2}\n", p.category.to_string(), p.sales));
        }
    }

    out.push_str("\nClusters (sales EWMA):\n");
    for b in bounds {
        out.push_str(&format!(
            "  Cluster {:<3} n={:<3} [{:.2}, {:.2}]\n",
            b.cluster, b.count, b.min_sales, b.max_sales
        ));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    use crate::cluster::{cluster_bounds, group_by_store};
    use crate::domain::{CategoryCode, ClusterPoint, DateRange, Product, Store, StoreCode};
    use crate::forecast::{Dataset, SeriesKind};

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn selection() -> Selection {
        Selection {
            store: Store::S001,
            product: Some(Product::Battery),
            range: DateRange { start: ymd(2023, 12, 1), end: ymd(2024, 2, 1) },
        }
    }

    #[test]
    fn summary_rounds_units_for_display() {
        let units = FutureUnits { min_required: 109.6, max_required: 220.4 };
        let txt = format_forecast_summary(&selection(), &DisplayConfig::default(), Some(&units));
        assert!(txt.contains("Product: Battery\n"));
        assert!(txt.contains("Store Location: S001\n"));
        assert!(txt.contains("Forecast Interval: weekly\n"));
        assert!(txt.contains("Min Required Units: 110 units\n"));
        assert!(txt.contains("Max Required Units: 220 units\n"));
    }

    #[test]
    fn summary_shows_na_without_units() {
        let txt = format_forecast_summary(&selection(), &DisplayConfig::default(), None);
        assert!(txt.contains("Min Required Units: N/A units\n"));
        assert!(txt.contains("Max Required Units: N/A units\n"));
    }

    #[test]
    fn table_marks_missing_values() {
        let chart = ChartSeries {
            labels: vec![ymd(2024, 1, 1), ymd(2024, 1, 8)],
            datasets: vec![
                Dataset { kind: SeriesKind::Actual, values: vec![Some(3.0), None] },
                Dataset { kind: SeriesKind::Predicted, values: vec![Some(2.5), Some(4.126)] },
            ],
        };
        let txt = format_series_table(&chart);
        let lines: Vec<&str> = txt.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("Actual Sales") && lines[0].contains("Predicted Sales"));
        assert!(lines[1].starts_with("2024-01-01") && lines[1].ends_with("2.50"));
        assert!(lines[2].contains("N/A") && lines[2].ends_with("4.13"));
    }

    #[test]
    fn cluster_report_uses_decoded_labels() {
        let points = vec![
            ClusterPoint { sales: 10.0, category: CategoryCode(4), store: StoreCode(1), cluster: 0 },
            ClusterPoint { sales: 30.0, category: CategoryCode(8), store: StoreCode(1), cluster: 1 },
        ];
        let txt = format_cluster_report(&group_by_store(&points), &cluster_bounds(&points));
        assert!(txt.contains("Store S002 (2 points):"));
        assert!(txt.contains("Engine"));
        assert!(txt.contains("Unknown (8)"));
        assert!(txt.contains("Cluster 1"));
    }
}
