//! Navigation state: which store, product and date range the forecast view shows.
//!
//! The selection is carried as a location string like
//! `S001?product=Brake+Pad&startDate=2024-01-01&endDate=2024-03-31`, so a view
//! can be reopened or shared. It is the only persisted state.

use chrono::NaiveDate;
use reqwest::Url;

use crate::domain::{DateRange, Product, Store};
use crate::error::AppError;

const LOCATION_BASE: &str = "http://mecha.local/";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub store: Store,
    /// `None` means no part is selected yet; nothing is fetched.
    pub product: Option<Product>,
    pub range: DateRange,
}

impl Selection {
    /// Default selection: first store, no product, both dates on `today`.
    pub fn new(today: NaiveDate) -> Self {
        Self {
            store: Store::S001,
            product: None,
            range: DateRange {
                start: today,
                end: today,
            },
        }
    }

    /// Parse a location string. Missing dates default to `today`.
    pub fn from_location(location: &str, today: NaiveDate) -> Result<Self, AppError> {
        let base = Url::parse(LOCATION_BASE)
            .map_err(|e| AppError::usage(format!("Invalid location base: {e}")))?;
        let url = base
            .join(location.trim().trim_start_matches('/'))
            .map_err(|e| AppError::usage(format!("Invalid location '{location}': {e}")))?;

        let store_id = url
            .path_segments()
            .and_then(|mut segs| segs.rfind(|s| !s.is_empty()))
            .ok_or_else(|| AppError::usage(format!("Location '{location}' has no store")))?;
        let store: Store = store_id.parse().map_err(AppError::usage)?;

        let mut selection = Self::new(today);
        selection.store = store;

        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "product" if value.is_empty() || value == "None" => selection.product = None,
                "product" => selection.product = Some(value.parse().map_err(AppError::usage)?),
                "startDate" => selection.range.start = parse_date(&value)?,
                "endDate" => selection.range.end = parse_date(&value)?,
                other => tracing::debug!(key = other, "ignoring unknown location parameter"),
            }
        }

        Ok(selection)
    }

    /// Render back to a location string.
    pub fn to_location(&self) -> String {
        let mut url = match Url::parse(LOCATION_BASE).and_then(|u| u.join(self.store.id())) {
            Ok(url) => url,
            Err(_) => return self.store.id().to_string(),
        };
        {
            let mut q = url.query_pairs_mut();
            if let Some(product) = self.product {
                q.append_pair("product", product.name());
            }
            q.append_pair("startDate", &self.range.start.format("%Y-%m-%d").to_string());
            q.append_pair("endDate", &self.range.end.format("%Y-%m-%d").to_string());
        }
        match url.query() {
            Some(query) => format!("{}?{query}", self.store.id()),
            None => self.store.id().to_string(),
        }
    }
}

fn parse_date(raw: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|e| AppError::usage(format!("Invalid date '{raw}' (expected YYYY-MM-DD): {e}")))
}
