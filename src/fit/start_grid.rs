//! Starting points for the nonlinear fit.
//!
//! Levenberg–Marquardt is a local method, so we refine several deterministic
//! starting points and keep the best converged result:
//!
//! 1. the log-linear regression estimate (when at least two counts are > 0)
//! 2. a fixed list of growth rates `b0`, each paired with the amplitude `a0`
//!    that is optimal for that rate
//!
//! The grid order is part of the contract: ties between equally good fits are
//! broken by grid index.

use crate::error::{AppError, ErrorKind};
use crate::math::{amplitude_for_rate, log_linear_fit};

/// One starting point `(a0, b0)` for the solver.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StartPoint {
    pub index: usize,
    pub a0: f64,
    pub b0: f64,
}

/// Build the ordered start grid for observations `(t_i, y_i)`.
pub fn build_start_grid(t: &[f64], y: &[f64], rates: &[f64]) -> Result<Vec<StartPoint>, AppError> {
    if rates.iter().any(|b| !b.is_finite()) {
        return Err(AppError::new(ErrorKind::Config, "Starting growth rates must be finite."));
    }

    let mut seeds: Vec<(f64, f64)> = Vec::with_capacity(rates.len() + 1);
    if let Some((a, b)) = log_linear_fit(t, y) {
        seeds.push((a, b));
    }
    for &b in rates {
        if let Some(a) = amplitude_for_rate(t, y, b) {
            if a.is_finite() {
                seeds.push((a, b));
            }
        }
    }

    Ok(seeds
        .into_iter()
        .enumerate()
        .map(|(index, (a0, b0))| StartPoint { index, a0, b0 })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_linear_seed_comes_first() {
        let t = [0.0, 1.0, 2.0, 3.0];
        let y = [2.0, 4.0, 8.0, 16.0];
        let grid = build_start_grid(&t, &y, &[0.1, 0.5]).unwrap();
        assert_eq!(grid.len(), 3);
        assert_eq!(grid[0].index, 0);
        assert!((grid[0].b0 - 2.0_f64.ln()).abs() < 1e-12);
        assert!((grid[0].a0 - 2.0).abs() < 1e-9);
        assert_eq!(grid[1].b0, 0.1);
        assert_eq!(grid[2].b0, 0.5);
    }

    #[test]
    fn all_zero_counts_still_get_rate_seeds() {
        let t = [0.0, 1.0, 2.0];
        let y = [0.0, 0.0, 0.0];
        let grid = build_start_grid(&t, &y, &[0.1, 0.0]).unwrap();
        assert_eq!(grid.len(), 2);
        assert!(grid.iter().all(|s| s.a0 == 0.0));
    }

    #[test]
    fn non_finite_rate_is_rejected() {
        assert!(build_start_grid(&[0.0, 1.0], &[1.0, 2.0], &[f64::NAN]).is_err());
    }
}
