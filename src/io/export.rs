//! Export actual and forecast series to CSV.
//!
//! The export is meant for spreadsheets and charting scripts: one row per
//! year, tagged `actual` (training series) or `forecast`.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::domain::ForecastOutcome;
use crate::error::{AppError, ErrorKind};

/// Write `year,kind,count` rows for the training and forecast series.
pub fn write_series_csv(path: &Path, outcome: &ForecastOutcome) -> Result<(), AppError> {
    let file = File::create(path).map_err(|e| {
        AppError::new(
            ErrorKind::Io,
            format!("Failed to create export CSV '{}': {e}", path.display()),
        )
    })?;
    let mut writer = BufWriter::new(file);
    write_series(&mut writer, outcome)?;
    writer
        .flush()
        .map_err(|e| AppError::new(ErrorKind::Io, format!("Failed to flush export CSV: {e}")))
}

/// Same as [`write_series_csv`] but into any writer.
pub fn write_series<W: Write>(out: &mut W, outcome: &ForecastOutcome) -> Result<(), AppError> {
    let io_err = |e: std::io::Error| AppError::new(ErrorKind::Io, format!("Failed to write export CSV: {e}"));

    writeln!(out, "year,kind,count").map_err(io_err)?;
    for (year, count) in outcome.training.iter() {
        writeln!(out, "{year},actual,{count}").map_err(io_err)?;
    }
    for p in &outcome.forecast {
        writeln!(out, "{},forecast,{:.4}", p.year, p.value).map_err(io_err)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FitDiagnostics, FitParams, YearValue};

    #[test]
    fn export_lists_actual_then_forecast_rows() {
        let outcome = ForecastOutcome {
            cutoff_year: 2022,
            horizon: 2,
            base_year: 2020,
            training: [(2020, 10), (2021, 20)].into_iter().collect(),
            params: FitParams { a: 10.0, b: 0.69 },
            forecast: vec![
                YearValue { year: 2022, value: 39.6 },
                YearValue { year: 2023, value: 79.25 },
            ],
            diagnostics: FitDiagnostics {
                n_points: 2,
                sse: 0.0,
                rmse: 0.0,
                evaluations: 1,
                termination: "ResidualsZero".to_string(),
                starts_tried: 1,
                starts_converged: 1,
                best_start: 0,
                warnings: Vec::new(),
            },
            starts: Vec::new(),
        };

        let mut buf = Vec::new();
        write_series(&mut buf, &outcome).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(
            text,
            "year,kind,count\n2020,actual,10\n2021,actual,20\n2022,forecast,39.6000\n2023,forecast,79.2500\n"
        );
    }
}
