//! Read/write forecast JSON files.
//!
//! A forecast file is the "portable" representation of one run:
//! - cutoff, horizon and base year
//! - fitted parameters `(a, b)` and fit diagnostics
//! - the training (actual) series and the forecast series
//!
//! The schema is defined by `domain::ForecastFile`.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use chrono::Utc;

use crate::domain::{ForecastFile, ForecastOutcome};
use crate::error::{AppError, ErrorKind};

/// Build the serializable view of a forecast outcome.
pub fn to_forecast_file(outcome: &ForecastOutcome) -> ForecastFile {
    ForecastFile {
        tool: "evf".to_string(),
        generated_at: Utc::now(),
        cutoff_year: outcome.cutoff_year,
        horizon: outcome.horizon,
        base_year: outcome.base_year,
        params: outcome.params,
        diagnostics: outcome.diagnostics.clone(),
        training: outcome.training.to_year_counts(),
        forecast: outcome.forecast.clone(),
    }
}

/// Write a forecast JSON file.
pub fn write_forecast_json(path: &Path, outcome: &ForecastOutcome) -> Result<(), AppError> {
    let file = File::create(path).map_err(|e| {
        AppError::new(
            ErrorKind::Io,
            format!("Failed to create forecast JSON '{}': {e}", path.display()),
        )
    })?;

    serde_json::to_writer_pretty(BufWriter::new(file), &to_forecast_file(outcome))
        .map_err(|e| AppError::new(ErrorKind::Io, format!("Failed to write forecast JSON: {e}")))?;

    Ok(())
}

/// Read a forecast JSON file.
pub fn read_forecast_json(path: &Path) -> Result<ForecastFile, AppError> {
    let file = File::open(path).map_err(|e| {
        AppError::new(
            ErrorKind::Io,
            format!("Failed to open forecast JSON '{}': {e}", path.display()),
        )
    })?;
    let forecast: ForecastFile = serde_json::from_reader(BufReader::new(file))
        .map_err(|e| AppError::data_format(format!("Invalid forecast JSON: {e}")))?;
    validate(&forecast)?;
    Ok(forecast)
}

fn validate(file: &ForecastFile) -> Result<(), AppError> {
    if file.forecast.len() != file.horizon {
        return Err(AppError::data_format(format!(
            "Forecast JSON lists {} forecast years but horizon is {}.",
            file.forecast.len(),
            file.horizon
        )));
    }
    let contiguous = file
        .forecast
        .iter()
        .enumerate()
        .all(|(k, p)| i64::from(p.year) == i64::from(file.cutoff_year) + k as i64);
    if !contiguous {
        return Err(AppError::data_format(
            "Forecast JSON years are not a contiguous run starting at the cutoff year.",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ForecastConfig;
    use crate::fit::forecast_growth;

    #[test]
    fn forecast_file_round_trips_through_disk() {
        let counts = [(2019, 100), (2020, 180), (2021, 330), (2022, 600)].into_iter().collect();
        let outcome = forecast_growth(&counts, &ForecastConfig::new(2023, 3)).unwrap();

        let path = std::env::temp_dir().join(format!("evf_forecast_{}.json", std::process::id()));
        write_forecast_json(&path, &outcome).unwrap();
        let loaded = read_forecast_json(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(loaded.tool, "evf");
        assert_eq!(loaded.base_year, 2019);
        // serde_json float parsing is not guaranteed bit-exact without `float_roundtrip`.
        assert!((loaded.params.a - outcome.params.a).abs() <= 1e-9 * outcome.params.a.abs());
        assert!((loaded.params.b - outcome.params.b).abs() <= 1e-12);
        assert_eq!(loaded.forecast.len(), outcome.forecast.len());
        for (l, o) in loaded.forecast.iter().zip(outcome.forecast.iter()) {
            assert_eq!(l.year, o.year);
            assert!((l.value - o.value).abs() <= 1e-9 * o.value.abs());
        }
        assert_eq!(loaded.training.len(), 4);
    }

    #[test]
    fn non_contiguous_forecast_is_rejected() {
        let counts = [(2019, 100), (2020, 180), (2021, 330)].into_iter().collect();
        let outcome = forecast_growth(&counts, &ForecastConfig::new(2022, 2)).unwrap();
        let mut file = to_forecast_file(&outcome);
        file.forecast[1].year += 1;
        assert!(validate(&file).is_err());
    }
}
