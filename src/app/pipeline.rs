//! Shared "forecast pipeline" logic used by both CLI and TUI front-ends.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! selection -> request -> fetch + validate -> transform
//!
//! The CLI and the TUI can then focus on presentation (printing vs widgets).

use chrono::NaiveDate;

use crate::data::{BackendClient, ForecastFetch, ForecastRequest};
use crate::domain::{DisplayConfig, ForecastData};
use crate::error::AppError;
use crate::forecast::{ForecastView, transform};
use crate::nav::Selection;

/// All computed outputs of a single `mecha forecast` run.
#[derive(Debug, Clone)]
pub struct ForecastRun {
    pub fetch: ForecastFetch,
    pub view: ForecastView,
}

/// Build the backend request for `selection`, or `None` when no product is chosen.
pub fn request_for(selection: &Selection) -> Option<ForecastRequest> {
    selection
        .product
        .map(|product| ForecastRequest::new(selection.store, product, &selection.range))
}

/// Fetch, validate and transform one forecast.
pub fn run_forecast(
    client: &BackendClient,
    selection: &Selection,
    display: &DisplayConfig,
    today: NaiveDate,
) -> Result<ForecastRun, AppError> {
    let request = request_for(selection)
        .ok_or_else(|| AppError::usage("No product selected. Pass --product or a --link with product=..."))?;
    let fetch = client.fetch_forecast(&request)?;
    let view = build_view(&fetch.data, selection, display, today);
    Ok(ForecastRun { fetch, view })
}

/// Recompute the view from already-fetched data.
///
/// This is what the TUI calls when only display options change.
pub fn build_view(
    data: &ForecastData,
    selection: &Selection,
    display: &DisplayConfig,
    today: NaiveDate,
) -> ForecastView {
    transform(data, display, &selection.range, today)
}
