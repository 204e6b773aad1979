//! Linear least squares helpers used to seed the nonlinear fit.
//!
//! The exponential model `y = a * exp(b * t)` is linear in `a` once `b` is
//! fixed, and `ln y = ln a + b * t` is linear in both parameters. Both facts
//! give cheap starting points for Levenberg–Marquardt:
//!
//! ```text
//! a*(b)       = argmin_a Σ (y_i - a e^{b t_i})^2
//! (ln a, b)   = OLS of ln y_i on [1, t_i]   (y_i > 0 only)
//! ```
//!
//! Implementation choices:
//! - We solve via SVD so tall systems (more rows than columns) are handled
//!   robustly. Nalgebra's `QR::solve` is intended for square systems.
//! - Parameter dimension is tiny (1–2 columns), so SVD cost is negligible.

use nalgebra::{DMatrix, DVector};

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);

    // Try progressively looser tolerances if strict solve fails.
    for &tol in &[1e-12, 1e-10, 1e-8] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}

/// Log-linear regression `ln y = ln a + b t` over points with `y > 0`.
///
/// Returns `(a, b)`, or `None` when fewer than two distinct `t` values carry a
/// positive `y`.
pub fn log_linear_fit(t: &[f64], y: &[f64]) -> Option<(f64, f64)> {
    let pairs: Vec<(f64, f64)> = t
        .iter()
        .zip(y.iter())
        .filter(|(ti, yi)| ti.is_finite() && yi.is_finite() && **yi > 0.0)
        .map(|(&ti, &yi)| (ti, yi.ln()))
        .collect();

    let distinct_t = pairs.iter().any(|(ti, _)| (*ti - pairs[0].0).abs() > 0.0);
    if pairs.len() < 2 || !distinct_t {
        return None;
    }

    let x = DMatrix::from_fn(pairs.len(), 2, |i, j| if j == 0 { 1.0 } else { pairs[i].0 });
    let ln_y = DVector::from_iterator(pairs.len(), pairs.iter().map(|(_, ly)| *ly));
    let beta = solve_least_squares(&x, &ln_y)?;

    let a = beta[0].exp();
    let b = beta[1];
    if a.is_finite() && b.is_finite() { Some((a, b)) } else { None }
}

/// Best amplitude `a` for a fixed growth rate `b`.
pub fn amplitude_for_rate(t: &[f64], y: &[f64], b: f64) -> Option<f64> {
    if t.is_empty() || t.len() != y.len() {
        return None;
    }
    let x = DMatrix::from_fn(t.len(), 1, |i, _| (b * t[i]).exp());
    if x.iter().any(|v| !v.is_finite()) {
        return None;
    }
    let yv = DVector::from_row_slice(y);
    let beta = solve_least_squares(&x, &yv)?;
    Some(beta[0])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn least_squares_solves_simple_system() {
        // Fit y = 2 + 3x on x = [0,1,2]
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        let y = DVector::from_row_slice(&[2.0, 5.0, 8.0]);

        let beta = solve_least_squares(&x, &y).unwrap();
        assert!((beta[0] - 2.0).abs() < 1e-10);
        assert!((beta[1] - 3.0).abs() < 1e-10);
    }

    #[test]
    fn log_linear_recovers_exact_exponential() {
        let t: Vec<f64> = (0..6).map(f64::from).collect();
        let y: Vec<f64> = t.iter().map(|&ti| 50.0 * (0.3 * ti).exp()).collect();
        let (a, b) = log_linear_fit(&t, &y).unwrap();
        assert!((a - 50.0).abs() < 1e-9);
        assert!((b - 0.3).abs() < 1e-12);
    }

    #[test]
    fn log_linear_needs_two_positive_points() {
        assert!(log_linear_fit(&[0.0, 1.0, 2.0], &[0.0, 0.0, 5.0]).is_none());
        assert!(log_linear_fit(&[0.0, 1.0], &[0.0, 0.0]).is_none());
    }

    #[test]
    fn amplitude_matches_closed_form() {
        let t = [0.0, 1.0, 2.0];
        let y = [1.0, 2.0, 4.0];
        let b = 2.0_f64.ln();
        let a = amplitude_for_rate(&t, &y, b).unwrap();
        assert!((a - 1.0).abs() < 1e-12);
    }

    #[test]
    fn amplitude_rejects_overflowing_basis() {
        assert!(amplitude_for_rate(&[0.0, 4.0e9], &[1.0, 2.0], 1.0).is_none());
    }
}
