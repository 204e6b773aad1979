//! Exponential growth forecasting.
//!
//! Given a yearly count series, a cutoff year and a horizon we:
//!
//! 1. keep years strictly before the cutoff (the training series)
//! 2. refit `count ≈ a * exp(b * t)` with `t = year - base_year` from every
//!    start in the grid (parallel, order-preserving)
//! 3. keep the converged run with the lowest SSE (ties: lowest grid index)
//! 4. evaluate the model for `cutoff_year .. cutoff_year + horizon - 1`
//!
//! Every step is deterministic, so identical inputs yield identical outputs.

use log::{info, warn};
use rayon::prelude::*;

use crate::domain::{
    FitDiagnostics, FitParams, ForecastConfig, ForecastOutcome, MAX_HORIZON, RECOMMENDED_MIN_TRAINING_YEARS,
    StartOutcome, YearValue, YearlyCounts,
};
use crate::error::{AppError, ErrorKind};
use crate::fit::solver::refine;
use crate::fit::start_grid::build_start_grid;
use crate::models::{predict, year_span};

/// Parameters plus diagnostics for one fitted training series.
#[derive(Debug, Clone)]
pub struct GrowthFit {
    pub params: FitParams,
    pub diagnostics: FitDiagnostics,
    pub starts: Vec<StartOutcome>,
}

/// Fit the training part of `counts` and project `config.horizon` years.
pub fn forecast_growth(counts: &YearlyCounts, config: &ForecastConfig) -> Result<ForecastOutcome, AppError> {
    validate_config(config)?;

    let training = counts.before(config.cutoff_year);
    if training.len() < 2 {
        return Err(AppError::insufficient_data(format!(
            "Need at least 2 distinct years before {} to fit a 2-parameter model, found {}.",
            config.cutoff_year,
            training.len()
        )));
    }
    let base_year = training
        .min_year()
        .ok_or_else(|| AppError::insufficient_data("Training series is empty."))?;

    let fit = fit_training(&training, base_year, config)?;
    let forecast = project(&fit.params, base_year, config.cutoff_year, config.horizon)?;

    info!(
        "forecast: base_year={base_year} a={:.6e} b={:.6} cutoff={} horizon={}",
        fit.params.a, fit.params.b, config.cutoff_year, config.horizon
    );

    Ok(ForecastOutcome {
        cutoff_year: config.cutoff_year,
        horizon: config.horizon,
        base_year,
        training,
        params: fit.params,
        forecast,
        diagnostics: fit.diagnostics,
        starts: fit.starts,
    })
}

/// Fit `a * exp(b * (year - base_year))` to a training series.
pub fn fit_training(training: &YearlyCounts, base_year: i32, config: &ForecastConfig) -> Result<GrowthFit, AppError> {
    let (t, y): (Vec<f64>, Vec<f64>) = training
        .iter()
        .map(|(year, count)| (year_span(year, base_year), count as f64))
        .unzip();
    fit_series(&t, &y, config)
}

/// Fit `a * exp(b * t)` to observations `(t_i, y_i)` from every start in the grid.
pub fn fit_series(t: &[f64], y: &[f64], config: &ForecastConfig) -> Result<GrowthFit, AppError> {
    let mut warnings = Vec::new();
    if t.len() < RECOMMENDED_MIN_TRAINING_YEARS {
        let msg = format!(
            "only {} training years; at least {RECOMMENDED_MIN_TRAINING_YEARS} are recommended for a stable fit",
            t.len()
        );
        warn!("{msg}");
        warnings.push(msg);
    }

    let grid = build_start_grid(t, y, &config.start_rates)?;
    if grid.is_empty() {
        return Err(AppError::fit_convergence(
            "No usable starting point for the solver (start grid is empty).",
        ));
    }

    // `collect` on an indexed parallel iterator preserves input order.
    let starts: Vec<StartOutcome> = grid
        .par_iter()
        .map(|start| refine(start, t, y, config.patience))
        .collect();

    let best = select_best(&starts).ok_or_else(|| {
        let reasons: Vec<String> = starts
            .iter()
            .map(|s| format!("#{} b0={:.3}: {}", s.index, s.b0, s.termination))
            .collect();
        AppError::fit_convergence(format!(
            "Least-squares solver did not converge from any of {} starting points ({}).",
            starts.len(),
            reasons.join("; ")
        ))
    })?;

    let params = best
        .params
        .filter(|p| p.a.is_finite() && p.b.is_finite())
        .ok_or_else(|| AppError::fit_convergence("Solver produced non-finite parameters."))?;

    let n = t.len();
    let diagnostics = FitDiagnostics {
        n_points: n,
        sse: best.sse,
        rmse: (best.sse / n as f64).sqrt(),
        evaluations: best.evaluations,
        termination: best.termination.clone(),
        starts_tried: starts.len(),
        starts_converged: starts.iter().filter(|s| s.converged).count(),
        best_start: best.index,
        warnings,
    };

    Ok(GrowthFit {
        params,
        diagnostics,
        starts,
    })
}

/// Evaluate the fitted model for `horizon` consecutive years from `cutoff_year`.
///
/// Non-finite projections are a `FitConvergence` error rather than output.
pub fn project(params: &FitParams, base_year: i32, cutoff_year: i32, horizon: usize) -> Result<Vec<YearValue>, AppError> {
    let mut out = Vec::with_capacity(horizon);
    for k in 0..horizon {
        let year = year_offset(cutoff_year, k)?;
        let value = predict(params, year_span(year, base_year));
        if !value.is_finite() {
            return Err(AppError::fit_convergence(format!(
                "Non-finite projection for {year} (a={}, b={}).",
                params.a, params.b
            )));
        }
        out.push(YearValue { year, value });
    }
    Ok(out)
}

fn select_best(starts: &[StartOutcome]) -> Option<&StartOutcome> {
    let mut best: Option<&StartOutcome> = None;
    for s in starts.iter().filter(|s| s.converged && s.sse.is_finite()) {
        best = match best {
            Some(b) if s.sse < b.sse || (s.sse == b.sse && s.index < b.index) => Some(s),
            Some(b) => Some(b),
            None => Some(s),
        };
    }
    best
}

fn validate_config(config: &ForecastConfig) -> Result<(), AppError> {
    if config.patience == 0 {
        return Err(AppError::new(ErrorKind::Config, "Solver patience must be >= 1."));
    }
    if config.horizon > MAX_HORIZON {
        return Err(AppError::new(
            ErrorKind::Config,
            format!("Horizon {} exceeds the maximum of {MAX_HORIZON} years.", config.horizon),
        ));
    }
    if config.horizon > 0 {
        year_offset(config.cutoff_year, config.horizon - 1)?;
    }
    Ok(())
}

fn year_offset(year: i32, k: usize) -> Result<i32, AppError> {
    i32::try_from(k)
        .ok()
        .and_then(|k| year.checked_add(k))
        .ok_or_else(|| AppError::new(ErrorKind::Config, format!("Horizon {k} is out of range.")))
}
