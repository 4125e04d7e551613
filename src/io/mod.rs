//! Input/output helpers.
//!
//! - forecast exports (CSV/JSON) (`export`)

pub mod export;

pub use export::*;
