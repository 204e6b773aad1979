//! Shared forecast pipeline used by both CLI and TUI front-ends.
//!
//! The workflow is:
//! load + clean CSV -> yearly counts -> fit training years -> project horizon
//!
//! The CLI and the TUI then only differ in presentation (printing vs widgets).

use std::path::Path;

use log::info;

use crate::aggregate::yearly_counts;
use crate::domain::{CleanedDataset, ForecastConfig, ForecastOutcome, IngestStats, YearlyCounts};
use crate::error::AppError;
use crate::fit::forecast_growth;
use crate::io::ingest::load_dataset;

/// All computed outputs of a single forecast run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub stats: IngestStats,
    pub yearly: YearlyCounts,
    pub outcome: ForecastOutcome,
}

/// Load the dataset and run the full forecast.
pub fn run_forecast(data_path: &Path, config: &ForecastConfig) -> Result<RunOutput, AppError> {
    let dataset = load_dataset(data_path)?;
    run_forecast_with_dataset(&dataset, config)
}

/// Forecast from an already-loaded dataset.
///
/// The TUI uses this to refit after a settings change without re-reading the file.
pub fn run_forecast_with_dataset(dataset: &CleanedDataset, config: &ForecastConfig) -> Result<RunOutput, AppError> {
    let yearly = yearly_counts(dataset);
    run_forecast_with_counts(dataset.stats, yearly, config)
}

/// Forecast from precomputed yearly counts.
pub fn run_forecast_with_counts(
    stats: IngestStats,
    yearly: YearlyCounts,
    config: &ForecastConfig,
) -> Result<RunOutput, AppError> {
    info!(
        "forecasting: {} model years, cutoff {}, horizon {}",
        yearly.len(),
        config.cutoff_year,
        config.horizon
    );
    let outcome = forecast_growth(&yearly, config)?;
    info!(
        "fit a={:.6} b={:.6} over {} training years",
        outcome.params.a,
        outcome.params.b,
        outcome.training.len()
    );

    Ok(RunOutput { stats, yearly, outcome })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::io::ingest::{clean, read_table};

    fn csv_with_years(years: &[(i32, usize)]) -> String {
        let mut csv = String::from("Model Year,Make\n");
        for &(year, n) in years {
            for _ in 0..n {
                csv.push_str(&format!("{year},TESLA\n"));
            }
        }
        csv
    }

    #[test]
    fn pipeline_trains_before_cutoff_and_keeps_full_counts() {
        let csv = csv_with_years(&[(2018, 10), (2019, 17), (2020, 27), (2021, 45), (2022, 74), (2023, 30)]);
        let ds = clean(&read_table(csv.as_bytes()).unwrap()).unwrap();
        let run = run_forecast_with_dataset(&ds, &ForecastConfig::new(2023, 3)).unwrap();

        assert_eq!(run.yearly.total(), ds.len() as u64);
        assert_eq!(run.yearly.get(2023), Some(30));
        assert_eq!(run.outcome.training.max_year(), Some(2022));
        assert_eq!(run.outcome.forecast.len(), 3);
        assert!(run.outcome.params.b > 0.0);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = run_forecast(Path::new("definitely/not/here.csv"), &ForecastConfig::new(2024, 6)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
    }
}
