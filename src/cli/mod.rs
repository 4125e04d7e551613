//! Command-line parsing for the forecast dashboard.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the transformer and presentation code.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

use crate::domain::{Interval, Product, Store};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "mecha", version, about = "Spare-part demand forecast dashboard")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch a forecast and print the summary, series table and/or plot.
    Forecast(ForecastArgs),
    /// Fetch the clustering result and print per-store groups and cluster spans.
    Clusters(BackendArgs),
    /// Launch the interactive TUI.
    ///
    /// This uses the same transformer as `mecha forecast`, but renders results
    /// in a terminal UI using Ratatui.
    Tui(TuiArgs),
}

/// Backend connection options shared by all commands.
#[derive(Debug, Args, Clone)]
pub struct BackendArgs {
    /// Backend base URL (default: $MECHA_BACKEND_URL or http://127.0.0.1:5000).
    #[arg(long)]
    pub backend: Option<String>,
}

/// What to forecast and how to show it.
#[derive(Debug, Args, Clone)]
pub struct SelectionArgs {
    /// Location string, e.g. `S001?product=Battery&startDate=2024-01-01&endDate=2024-03-31`.
    /// Explicit flags below override its fields.
    #[arg(long)]
    pub link: Option<String>,

    /// Store (S001..S005).
    #[arg(short = 's', long)]
    pub store: Option<Store>,

    /// Spare part, e.g. "Brake Pad" or brake-pad.
    #[arg(short = 'p', long)]
    pub product: Option<Product>,

    /// Range start (YYYY-MM-DD). Defaults to the reference date.
    #[arg(long)]
    pub start: Option<NaiveDate>,

    /// Range end (YYYY-MM-DD). Defaults to the reference date.
    #[arg(long)]
    pub end: Option<NaiveDate>,

    /// Reference "today" for future required units (default: $MECHA_TODAY or 2024-01-01).
    #[arg(long)]
    pub today: Option<NaiveDate>,

    /// Chart date thinning.
    #[arg(short = 'i', long, value_enum, default_value_t = Interval::Weekly)]
    pub interval: Interval,

    /// Hide the predicted sales series.
    #[arg(long)]
    pub hide_predicted: bool,

    /// Hide the minimum required units series.
    #[arg(long)]
    pub hide_min: bool,

    /// Hide the maximum required units series.
    #[arg(long)]
    pub hide_max: bool,
}

#[derive(Debug, Args, Clone)]
pub struct ForecastArgs {
    #[command(flatten)]
    pub selection: SelectionArgs,

    #[command(flatten)]
    pub backend: BackendArgs,

    /// Print the per-date series table.
    #[arg(long)]
    pub table: bool,

    /// Disable the terminal plot.
    #[arg(long)]
    pub no_plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,

    /// Export the chart series to CSV.
    #[arg(long)]
    pub export: Option<PathBuf>,

    /// Export selection, display options and derived view to JSON.
    #[arg(long = "export-json")]
    pub export_json: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct TuiArgs {
    #[command(flatten)]
    pub selection: SelectionArgs,

    #[command(flatten)]
    pub backend: BackendArgs,

    /// Append logs to this file (the TUI discards logs otherwise).
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}
