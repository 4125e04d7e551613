//! Backend data access.
//!
//! - `backend`: blocking HTTP client for `/forecast` and `/clustering`
//! - `wire`: JSON shapes and validation into domain types
//! - `generation`: request tagging so stale responses are discarded

pub mod backend;
pub mod generation;
pub mod wire;

pub use backend::{BackendClient, ClusterFetch, ForecastFetch};
pub use generation::{RequestGate, RequestTicket};
pub use wire::{ForecastRequest, ValidationIssue, summarize_issues};
