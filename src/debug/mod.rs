//! Debug bundle writer for inspecting a forecast run.
//!
//! A bundle is a markdown file under `debug/` that records the inputs, the
//! yearly series, every solver start and how it ended, and the fitted curve
//! against the training data.

use std::fmt::Write as _;
use std::fs::{File, create_dir_all};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use crate::app::pipeline::RunOutput;
use crate::domain::ForecastConfig;
use crate::error::{AppError, ErrorKind};
use crate::models::{predict, year_span};

/// Write a bundle to `debug/evf_debug_<cutoff>_<timestamp>.md`.
pub fn write_debug_bundle(data_path: &Path, config: &ForecastConfig, run: &RunOutput) -> Result<PathBuf, AppError> {
    write_debug_bundle_in(Path::new("debug"), data_path, config, run)
}

/// Same as [`write_debug_bundle`] with an explicit output directory.
pub fn write_debug_bundle_in(
    dir: &Path,
    data_path: &Path,
    config: &ForecastConfig,
    run: &RunOutput,
) -> Result<PathBuf, AppError> {
    create_dir_all(dir).map_err(|e| io_err(format!("Failed to create debug dir '{}': {e}", dir.display())))?;

    let now = Local::now();
    let path = dir.join(format!(
        "evf_debug_{}_{}.md",
        config.cutoff_year,
        now.format("%Y%m%d_%H%M%S")
    ));

    let text = render_debug_bundle(now, data_path, config, run);
    let mut file = File::create(&path).map_err(|e| io_err(format!("Failed to create debug file: {e}")))?;
    file.write_all(text.as_bytes())
        .map_err(|e| io_err(format!("Failed to write debug file: {e}")))?;

    Ok(path)
}

/// The bundle contents.
pub fn render_debug_bundle(
    generated: DateTime<Local>,
    data_path: &Path,
    config: &ForecastConfig,
    run: &RunOutput,
) -> String {
    let outcome = &run.outcome;
    let mut out = String::new();

    // Writing into a String cannot fail.
    let _ = writeln!(out, "# evf debug bundle");
    let _ = writeln!(out, "- generated: {}", generated.to_rfc3339());
    let _ = writeln!(out, "- dataset: {}", data_path.display());
    let _ = writeln!(out, "- cutoff_year: {}", config.cutoff_year);
    let _ = writeln!(out, "- horizon: {}", config.horizon);
    let _ = writeln!(out, "- patience: {}", config.patience);
    let _ = writeln!(out, "- start_rates: {}", fmt_vec(&config.start_rates));
    let _ = writeln!(
        out,
        "- rows: read={} dropped={} used={}",
        run.stats.rows_read, run.stats.rows_dropped, run.stats.rows_used
    );

    let _ = writeln!(out, "\n## Yearly counts");
    let _ = writeln!(out, "| year | count | training |");
    let _ = writeln!(out, "| - | - | - |");
    for (year, count) in run.yearly.iter() {
        let training = if year < outcome.cutoff_year { "yes" } else { "no" };
        let _ = writeln!(out, "| {year} | {count} | {training} |");
    }

    let _ = writeln!(out, "\n## Solver starts");
    let _ = writeln!(out, "| # | a0 | b0 | termination | evals | sse | a | b | chosen |");
    let _ = writeln!(out, "| - | - | - | - | - | - | - | - | - |");
    for s in &outcome.starts {
        let (a, b) = s
            .params
            .map(|p| (format!("{:.6}", p.a), format!("{:.6}", p.b)))
            .unwrap_or_else(|| ("-".to_string(), "-".to_string()));
        let chosen = s.index == outcome.diagnostics.best_start;
        let _ = writeln!(
            out,
            "| {} | {:.6} | {:.4} | {} | {} | {} | {a} | {b} | {} |",
            s.index,
            s.a0,
            s.b0,
            s.termination,
            s.evaluations,
            fmt_opt(Some(s.sse)),
            if chosen { "*" } else { "" }
        );
    }

    let d = &outcome.diagnostics;
    let _ = writeln!(out, "\n## Fit");
    let _ = writeln!(out, "- base_year: {}", outcome.base_year);
    let _ = writeln!(out, "- a: {:.6}", outcome.params.a);
    let _ = writeln!(out, "- b: {:.6}", outcome.params.b);
    let _ = writeln!(out, "- sse: {:.6} rmse: {:.6} (n={})", d.sse, d.rmse, d.n_points);
    for w in &d.warnings {
        let _ = writeln!(out, "- warning: {w}");
    }

    let _ = writeln!(out, "\n## Fitted vs actual");
    let _ = writeln!(out, "| year | actual | fitted | residual |");
    let _ = writeln!(out, "| - | - | - | - |");
    for (year, count) in outcome.training.iter() {
        let fitted = predict(&outcome.params, year_span(year, outcome.base_year));
        let _ = writeln!(
            out,
            "| {year} | {count} | {} | {} |",
            fmt_opt(Some(fitted)),
            fmt_opt(Some(count as f64 - fitted))
        );
    }

    let _ = writeln!(out, "\n## Forecast");
    let _ = writeln!(out, "| year | value | actual (partial) |");
    let _ = writeln!(out, "| - | - | - |");
    for p in &outcome.forecast {
        let actual = run.yearly.get(p.year).map(|c| c.to_string()).unwrap_or_else(|| "-".to_string());
        let _ = writeln!(out, "| {} | {} | {actual} |", p.year, fmt_opt(Some(p.value)));
    }

    out
}

fn fmt_vec(values: &[f64]) -> String {
    let parts: Vec<String> = values.iter().map(|v| format!("{v}")).collect();
    format!("[{}]", parts.join(", "))
}

fn fmt_opt(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{v:.3}"),
        _ => "-".to_string(),
    }
}

fn io_err(msg: String) -> AppError {
    AppError::new(ErrorKind::Io, msg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::pipeline::run_forecast_with_counts;
    use crate::domain::{IngestStats, YearlyCounts};

    fn run() -> (ForecastConfig, RunOutput) {
        let yearly: YearlyCounts = [(2019, 100), (2020, 150), (2021, 225), (2022, 338), (2023, 80)]
            .into_iter()
            .collect();
        let stats = IngestStats {
            rows_read: 900,
            rows_dropped: 7,
            rows_used: 893,
        };
        let config = ForecastConfig::new(2023, 2);
        let run = run_forecast_with_counts(stats, yearly, &config).unwrap();
        (config, run)
    }

    #[test]
    fn bundle_lists_inputs_starts_and_partial_year() {
        let (config, run) = run();
        let text = render_debug_bundle(Local::now(), Path::new("ev.csv"), &config, &run);

        assert!(text.contains("- dataset: ev.csv"));
        assert!(text.contains("| 2023 | 80 | no |"));
        assert!(text.contains("| 2022 | 338 | yes |"));
        assert_eq!(text.matches(" | * |").count(), 1);
        let start_rows = text
            .lines()
            .skip_while(|l| !l.starts_with("## Solver starts"))
            .skip(3)
            .take_while(|l| l.starts_with('|'))
            .count();
        assert_eq!(start_rows, run.outcome.starts.len());
        assert!(text.contains("## Forecast"));
    }

    #[test]
    fn bundle_is_written_under_the_given_dir() {
        let (config, run) = run();
        let dir = std::env::temp_dir().join(format!("evf-debug-{}", std::process::id()));
        let path = write_debug_bundle_in(&dir, Path::new("ev.csv"), &config, &run).unwrap();

        assert!(path.starts_with(&dir));
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("# evf debug bundle"));
        let _ = std::fs::remove_dir_all(&dir);
    }
}
