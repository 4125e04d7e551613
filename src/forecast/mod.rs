//! Forecast view transformer.
//!
//! Pure functions from a validated forecast payload plus display options to
//! exactly what the chart and summary show:
//!
//! - `select`: interval-based date thinning
//! - `series`: index-aligned chart datasets
//! - `units`: the "future required units" aggregate

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::{DateRange, DisplayConfig, ForecastData};

pub mod select;
pub mod series;
pub mod units;

pub use select::{select_visible_dates, select_visible_indices};
pub use series::{ChartSeries, Dataset, SeriesKind, build_series};
pub use units::{FutureUnits, compute_future_units};

/// Everything derived from one forecast payload for display.
///
/// Both fields are `None` for an empty forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastView {
    pub chart: Option<ChartSeries>,
    pub future_units: Option<FutureUnits>,
}

impl ForecastView {
    pub fn is_empty(&self) -> bool {
        self.chart.is_none() && self.future_units.is_none()
    }
}

/// Derive the chart and the future-units aggregate.
pub fn transform(
    data: &ForecastData,
    config: &DisplayConfig,
    range: &DateRange,
    today: NaiveDate,
) -> ForecastView {
    let chart = build_series(&data.predicted, &data.actual, config);
    let future_units = compute_future_units(&data.predicted, today, range.end);

    tracing::debug!(
        points = data.predicted.len(),
        labels = chart.as_ref().map(|c| c.len()).unwrap_or(0),
        interval = config.interval.as_str(),
        has_units = future_units.is_some(),
        "forecast view rebuilt"
    );

    ForecastView { chart, future_units }
}
