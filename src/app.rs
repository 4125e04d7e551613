//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments and `.env` configuration
//! - installs the tracing subscriber
//! - fetches forecasts / clusters
//! - prints reports/plots
//! - writes optional exports

use chrono::NaiveDate;
use clap::Parser;

use crate::cli::{BackendArgs, Command, ForecastArgs, SelectionArgs, TuiArgs};
use crate::cluster::{cluster_bounds, group_by_store};
use crate::data::{BackendClient, summarize_issues};
use crate::domain::{DisplayConfig, default_reference_date};
use crate::error::AppError;
use crate::logging::{self, LogTarget};
use crate::nav::Selection;

pub mod pipeline;

const TODAY_ENV: &str = "MECHA_TODAY";

/// Entry point for the `mecha` binary.
pub fn run() -> Result<(), AppError> {
    // We want `mecha` and `mecha -p Battery` to behave like `mecha tui ...`.
    //
    // Clap requires a subcommand name, so we do a small, explicit rewrite of the
    // argv list before parsing.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);
    dotenvy::dotenv().ok();

    match cli.command {
        Command::Forecast(args) => {
            logging::init(LogTarget::Stderr, "warn")?;
            handle_forecast(args)
        }
        Command::Clusters(args) => {
            logging::init(LogTarget::Stderr, "warn")?;
            handle_clusters(args)
        }
        Command::Tui(args) => {
            let target = match &args.log_file {
                Some(path) => LogTarget::File(path),
                None => LogTarget::Off,
            };
            logging::init(target, "info")?;
            handle_tui(args)
        }
    }
}

fn handle_forecast(args: ForecastArgs) -> Result<(), AppError> {
    let today = resolve_today(args.selection.today)?;
    let selection = selection_from_args(&args.selection, today)?;
    let display = display_from_args(&args.selection);
    let client = client_from_args(&args.backend);

    let run = pipeline::run_forecast(&client, &selection, &display, today)?;

    println!(
        "{}",
        crate::report::format_forecast_summary(&selection, &display, run.view.future_units.as_ref())
    );
    println!("Link: {}", selection.to_location());
    if let Some(summary) = summarize_issues(&run.fetch.issues) {
        println!("Warning: {summary}");
    }

    let Some(chart) = &run.view.chart else {
        println!("No forecast data for this selection.");
        return Ok(());
    };

    if args.table {
        println!();
        println!("{}", crate::report::format_series_table(chart));
    }
    if !args.no_plot {
        println!();
        println!("{}", crate::plot::render_ascii_plot(chart, args.width, args.height));
    }

    // Optional exports.
    if let Some(path) = &args.export {
        crate::io::write_series_csv(path, chart)?;
    }
    if let Some(path) = &args.export_json {
        crate::io::write_view_json(path, &selection, &display, &run.view)?;
    }

    Ok(())
}

fn handle_clusters(args: BackendArgs) -> Result<(), AppError> {
    let client = client_from_args(&args);
    let fetch = client.fetch_clusters()?;

    let groups = group_by_store(&fetch.points);
    let bounds = cluster_bounds(&fetch.points);
    println!("{}", crate::report::format_cluster_report(&groups, &bounds));
    if let Some(summary) = summarize_issues(&fetch.issues) {
        println!("Warning: {summary}");
    }
    Ok(())
}

fn handle_tui(args: TuiArgs) -> Result<(), AppError> {
    let today = resolve_today(args.selection.today)?;
    let selection = selection_from_args(&args.selection, today)?;
    let display = display_from_args(&args.selection);
    let client = client_from_args(&args.backend);
    crate::tui::run(client, selection, display, today)
}

fn client_from_args(args: &BackendArgs) -> BackendClient {
    BackendClient::from_env(args.backend.as_deref())
}

/// Reference date: `--today`, else `MECHA_TODAY`, else 2024-01-01.
pub fn resolve_today(explicit: Option<NaiveDate>) -> Result<NaiveDate, AppError> {
    if let Some(date) = explicit {
        return Ok(date);
    }
    match std::env::var(TODAY_ENV) {
        Ok(raw) if !raw.trim().is_empty() => NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
            .map_err(|e| AppError::usage(format!("Invalid {TODAY_ENV} '{raw}': {e}"))),
        _ => Ok(default_reference_date()),
    }
}

/// Merge `--link` with explicit flags (flags win).
pub fn selection_from_args(args: &SelectionArgs, today: NaiveDate) -> Result<Selection, AppError> {
    let mut selection = match &args.link {
        Some(link) => Selection::from_location(link, today)?,
        None => Selection::new(today),
    };
    if let Some(store) = args.store {
        selection.store = store;
    }
    if args.product.is_some() {
        selection.product = args.product;
    }
    if let Some(start) = args.start {
        selection.range.start = start;
    }
    if let Some(end) = args.end {
        selection.range.end = end;
    }
    if selection.range.end < selection.range.start {
        return Err(AppError::usage(format!(
            "End date {} is before start date {}.",
            selection.range.end, selection.range.start
        )));
    }
    Ok(selection)
}

pub fn display_from_args(args: &SelectionArgs) -> DisplayConfig {
    DisplayConfig {
        interval: args.interval,
        show_predicted: !args.hide_predicted,
        show_min: !args.hide_min,
        show_max: !args.hide_max,
    }
}

/// Rewrite argv so `mecha` defaults to `mecha tui`.
///
/// Rules:
/// - `mecha`                      -> `mecha tui`
/// - `mecha -p Battery ...`       -> `mecha tui -p Battery ...`
/// - `mecha --help/--version/-h`  -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("tui".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "forecast" | "clusters" | "tui");
    if is_subcommand {
        return argv;
    }

    // If the first token is a flag, treat it as "tui flags".
    if arg1.starts_with('-') {
        argv.insert(1, "tui".to_string());
        return argv;
    }

    // Otherwise, leave as-is.
    argv
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Interval, Product, Store};

    fn args(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn bare_invocation_launches_tui() {
        assert_eq!(rewrite_args(args(&["mecha"])), args(&["mecha", "tui"]));
        assert_eq!(
            rewrite_args(args(&["mecha", "-p", "Battery"])),
            args(&["mecha", "tui", "-p", "Battery"])
        );
        assert_eq!(rewrite_args(args(&["mecha", "--help"])), args(&["mecha", "--help"]));
        assert_eq!(rewrite_args(args(&["mecha", "clusters"])), args(&["mecha", "clusters"]));
    }

    fn parse_selection(argv: &[&str]) -> SelectionArgs {
        let cli = crate::cli::Cli::parse_from(args(argv));
        match cli.command {
            Command::Forecast(a) => a.selection,
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn flags_override_link() {
        let today = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let sel_args = parse_selection(&[
            "mecha",
            "forecast",
            "--link",
            "S002?product=Fans&startDate=2024-01-01&endDate=2024-02-01",
            "--product",
            "spark-plugs",
            "--end",
            "2024-03-01",
            "--interval",
            "quarterly",
            "--hide-min",
        ]);
        let selection = selection_from_args(&sel_args, today).unwrap();
        assert_eq!(selection.store, Store::S002);
        assert_eq!(selection.product, Some(Product::SparkPlugs));
        assert_eq!(selection.range.end, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());

        let display = display_from_args(&sel_args);
        assert_eq!(display.interval, Interval::Quarterly);
        assert!(display.show_predicted && !display.show_min && display.show_max);
    }

    #[test]
    fn inverted_range_is_rejected() {
        let today = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let sel_args = parse_selection(&[
            "mecha", "forecast", "-p", "Fuse", "--start", "2024-02-01", "--end", "2024-01-01",
        ]);
        assert!(selection_from_args(&sel_args, today).is_err());
    }

    #[test]
    fn explicit_today_wins() {
        let d = NaiveDate::from_ymd_opt(2025, 5, 5).unwrap();
        assert_eq!(resolve_today(Some(d)).unwrap(), d);
    }
}
