//! `mecha` library crate.
//!
//! The binary (`mecha`) is a thin wrapper around this library so that:
//!
//! - the forecast transformer is testable without a backend or a terminal
//! - the CLI and the TUI share one pipeline
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod cli;
pub mod cluster;
pub mod data;
pub mod domain;
pub mod error;
pub mod forecast;
pub mod io;
pub mod logging;
pub mod nav;
pub mod plot;
pub mod report;
pub mod tui;
