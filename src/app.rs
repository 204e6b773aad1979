//! Top-level application orchestration.
//!
//! `src/main.rs` only sets up logging; this module is the "real main" that:
//! - loads `.env` and parses CLI arguments
//! - resolves the dataset path and forecast settings
//! - runs the pipeline and prints reports/plots
//! - writes optional exports

use chrono::{Datelike, Local};
use clap::Parser;
use log::info;

use crate::cli::picker::resolve_dataset_path;
use crate::cli::{Command, ForecastArgs, PlotArgs, SampleArgs, SummaryArgs};
use crate::data::{SampleConfig, generate_sample, write_sample_csv};
use crate::domain::{ForecastConfig, RunConfig};
use crate::error::AppError;
use crate::io::ingest::load_dataset;

pub mod pipeline;

/// Entry point for the `evf` binary.
pub fn run() -> Result<(), AppError> {
    // A missing `.env` is fine; variables may come from the real environment.
    if let Ok(path) = dotenvy::dotenv() {
        info!("loaded environment from {}", path.display());
    }

    // `evf` and `evf --data x.csv` behave like `evf tui ...`. Clap needs the
    // subcommand name, so argv is rewritten before parsing.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    match cli.command {
        Command::Forecast(args) => handle_forecast(args),
        Command::Summary(args) => handle_summary(args),
        Command::Plot(args) => handle_plot(args),
        Command::Sample(args) => handle_sample(args),
        Command::Tui(args) => handle_tui(args),
    }
}

fn handle_forecast(args: ForecastArgs) -> Result<(), AppError> {
    let config = run_config_from_args(&args)?;
    let run = pipeline::run_forecast(&config.data_path, &config.forecast)?;

    println!(
        "{}",
        crate::report::format_run_summary(&run.stats, &run.yearly, &run.outcome)
    );
    println!("{}", crate::report::format_forecast_table(&run.outcome));

    if config.plot {
        let plot = crate::plot::render_forecast_plot(&run.outcome, config.plot_width, config.plot_height);
        println!("{plot}");
    }

    if let Some(path) = &config.export_csv {
        crate::io::export::write_series_csv(path, &run.outcome)?;
        info!("wrote series CSV to {}", path.display());
    }
    if let Some(path) = &config.export_json {
        crate::io::forecast_file::write_forecast_json(path, &run.outcome)?;
        info!("wrote forecast JSON to {}", path.display());
    }

    Ok(())
}

fn handle_summary(args: SummaryArgs) -> Result<(), AppError> {
    let data_path = resolve_dataset_path(args.data.data.as_deref())?;
    let dataset = load_dataset(&data_path)?;
    let summary = crate::report::build_summary(&dataset, args.top, args.bins)?;
    print!("{}", crate::report::format_exploratory_summary(&summary));
    Ok(())
}

fn handle_plot(args: PlotArgs) -> Result<(), AppError> {
    let file = crate::io::forecast_file::read_forecast_json(&args.file)?;
    let plot = crate::plot::render_forecast_file_plot(&file, args.width, args.height);
    println!("{plot}");
    Ok(())
}

fn handle_sample(args: SampleArgs) -> Result<(), AppError> {
    let config = SampleConfig {
        records: args.records,
        seed: args.seed,
        start_year: args.start_year,
        end_year: args.end_year,
        missing_rate: args.missing_rate,
        ..SampleConfig::default()
    };
    let sample = generate_sample(&config)?;
    write_sample_csv(&args.out, &sample)?;
    println!("Wrote {} rows to {}", sample.rows.len(), args.out.display());
    Ok(())
}

fn handle_tui(args: ForecastArgs) -> Result<(), AppError> {
    let config = run_config_from_args(&args)?;
    crate::tui::run(config.data_path, config.forecast)
}

/// Resolve CLI/env values into a [`RunConfig`].
///
/// The cutoff year defaults to the previous calendar year, the last one
/// assumed to be completely reported.
pub fn run_config_from_args(args: &ForecastArgs) -> Result<RunConfig, AppError> {
    let data_path = resolve_dataset_path(args.data.data.as_deref())?;
    let cutoff_year = args.cutoff_year.unwrap_or_else(|| Local::now().year() - 1);

    Ok(RunConfig {
        data_path,
        forecast: ForecastConfig {
            patience: args.patience,
            ..ForecastConfig::new(cutoff_year, args.horizon)
        },
        plot: !args.no_plot,
        plot_width: args.width,
        plot_height: args.height,
        export_csv: args.export.clone(),
        export_json: args.export_json.clone(),
    })
}

/// Rewrite argv so `evf` defaults to `evf tui`.
///
/// Rules:
/// - `evf`                      -> `evf tui`
/// - `evf --data ev.csv ...`    -> `evf tui --data ev.csv ...`
/// - `evf --help/--version/-h`  -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("tui".to_string());
        return argv;
    };

    if matches!(arg1.as_str(), "-h" | "--help" | "-V" | "--version" | "help") {
        return argv;
    }
    if matches!(arg1.as_str(), "forecast" | "summary" | "plot" | "sample" | "tui") {
        return argv;
    }
    // A leading flag means "tui flags".
    if arg1.starts_with('-') {
        argv.insert(1, "tui".to_string());
    }
    argv
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn bare_invocation_opens_tui() {
        assert_eq!(rewrite_args(argv(&["evf"])), argv(&["evf", "tui"]));
        assert_eq!(
            rewrite_args(argv(&["evf", "--data", "ev.csv"])),
            argv(&["evf", "tui", "--data", "ev.csv"])
        );
    }

    #[test]
    fn subcommands_and_help_are_left_alone() {
        for args in [["evf", "forecast"], ["evf", "sample"], ["evf", "--help"], ["evf", "-V"]] {
            assert_eq!(rewrite_args(argv(&args)), argv(&args));
        }
    }

    #[test]
    fn run_config_carries_flags_into_the_forecast() {
        let path = std::env::temp_dir().join(format!("evf-app-{}.csv", std::process::id()));
        std::fs::write(&path, "Model Year\n2020\n").unwrap();

        let cli = crate::cli::Cli::try_parse_from([
            "evf",
            "forecast",
            "--data",
            path.to_str().unwrap(),
            "--cutoff-year",
            "2021",
            "--horizon",
            "4",
            "--patience",
            "50",
            "--no-plot",
        ])
        .unwrap();
        let Command::Forecast(args) = cli.command else {
            panic!("expected forecast");
        };
        let config = run_config_from_args(&args).unwrap();

        assert_eq!(config.forecast.cutoff_year, 2021);
        assert_eq!(config.forecast.horizon, 4);
        assert_eq!(config.forecast.patience, 50);
        assert!(!config.plot);
        let _ = std::fs::remove_file(&path);
    }
}
