//! Command-line parsing for the EV registration forecaster.
//!
//! Argument parsing and dispatch live here and in `app`; nothing in this
//! module touches the data or the fit.
//!
//! Flags that have an `EVF_*` variable fall back to the environment (and so to
//! a `.env` file, which `app::run` loads before parsing).

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::{DEFAULT_HORIZON, DEFAULT_PATIENCE};

pub mod picker;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "evf", version, about = "EV registration analysis and exponential growth forecast")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fit the growth curve, print diagnostics and the forecast, optionally plot/export.
    Forecast(ForecastArgs),
    /// Print exploratory aggregates (types, geography, makes, models, range).
    Summary(SummaryArgs),
    /// Plot a previously exported forecast JSON.
    Plot(PlotArgs),
    /// Write a synthetic registration CSV.
    Sample(SampleArgs),
    /// Launch the interactive TUI.
    ///
    /// Runs the same pipeline as `evf forecast` and lets you move the cutoff
    /// year and horizon interactively.
    Tui(ForecastArgs),
}

/// Dataset location shared by the data-reading commands.
#[derive(Debug, Args, Clone)]
pub struct DataArgs {
    /// Registration CSV. When absent, you are prompted to pick one from the current directory.
    #[arg(short = 'f', long = "data", env = "EVF_DATASET", value_name = "CSV")]
    pub data: Option<PathBuf>,
}

/// Options for fitting and forecasting.
#[derive(Debug, Args, Clone)]
pub struct ForecastArgs {
    #[command(flatten)]
    pub data: DataArgs,

    /// First year excluded from training. Defaults to last calendar year.
    #[arg(short = 'c', long, env = "EVF_CUTOFF_YEAR")]
    pub cutoff_year: Option<i32>,

    /// Number of projected years, starting at the cutoff year.
    #[arg(short = 'n', long, env = "EVF_HORIZON", default_value_t = DEFAULT_HORIZON)]
    pub horizon: usize,

    /// Solver patience (evaluation budget multiplier).
    #[arg(long, env = "EVF_PATIENCE", default_value_t = DEFAULT_PATIENCE)]
    pub patience: usize,

    /// Disable the terminal plot.
    #[arg(long)]
    pub no_plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 80)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 20)]
    pub height: usize,

    /// Export actual + forecast series to CSV.
    #[arg(long, value_name = "CSV")]
    pub export: Option<PathBuf>,

    /// Export the forecast (params, diagnostics, series) to JSON.
    #[arg(long = "export-json", value_name = "JSON")]
    pub export_json: Option<PathBuf>,
}

/// Options for the exploratory summary.
#[derive(Debug, Args, Clone)]
pub struct SummaryArgs {
    #[command(flatten)]
    pub data: DataArgs,

    /// Rows per ranked table.
    #[arg(long, default_value_t = 10)]
    pub top: usize,

    /// Electric range histogram bins.
    #[arg(long, default_value_t = 10)]
    pub bins: usize,
}

/// Options for plotting a saved forecast.
#[derive(Debug, Args)]
pub struct PlotArgs {
    /// Forecast JSON produced by `evf forecast --export-json`.
    #[arg(long, value_name = "JSON")]
    pub file: PathBuf,

    /// Plot width (columns).
    #[arg(long, default_value_t = 80)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 20)]
    pub height: usize,
}

/// Options for synthetic data generation.
#[derive(Debug, Args)]
pub struct SampleArgs {
    /// Output CSV path.
    #[arg(long, value_name = "CSV")]
    pub out: PathBuf,

    /// Approximate number of records to generate.
    #[arg(long, default_value_t = 5_000)]
    pub records: usize,

    /// Random seed (same seed, same file).
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// First model year.
    #[arg(long, default_value_t = 2011)]
    pub start_year: i32,

    /// Last model year (inclusive).
    #[arg(long, default_value_t = 2024)]
    pub end_year: i32,

    /// Fraction of rows with one blank cell.
    #[arg(long, default_value_t = 0.01)]
    pub missing_rate: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forecast_flags_parse() {
        let cli = Cli::try_parse_from([
            "evf",
            "forecast",
            "--data",
            "ev.csv",
            "--cutoff-year",
            "2024",
            "--horizon",
            "3",
            "--no-plot",
        ])
        .unwrap();
        let Command::Forecast(args) = cli.command else {
            panic!("expected forecast");
        };
        assert_eq!(args.data.data, Some(PathBuf::from("ev.csv")));
        assert_eq!(args.cutoff_year, Some(2024));
        assert_eq!(args.horizon, 3);
        assert!(args.no_plot);
    }

    #[test]
    fn plot_requires_file() {
        assert!(Cli::try_parse_from(["evf", "plot"]).is_err());
    }
}
