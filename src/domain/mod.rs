//! Domain types used throughout the crate.
//!
//! This module defines:
//!
//! - forecast payload points (`ForecastPoint`, `ActualPoint`, `ForecastData`)
//! - view inputs (`Interval`, `DisplayConfig`, `DateRange`)
//! - catalog enums (`Store`, `Product`, `Category`) and raw wire codes
//! - clustering results (`ClusterPoint`)

pub mod types;

pub use types::*;
