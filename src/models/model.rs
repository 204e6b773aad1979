//! Exponential growth model evaluation.
//!
//! The fitter relies on two primitive operations:
//! - predict `f(t) = a * exp(b * t)` (for residuals, forecasts and plots)
//! - the Jacobian row `∂f/∂(a, b)` at a given `t` (for Levenberg–Marquardt)

use crate::domain::FitParams;

/// Predict the registration count `t` years after the base year.
pub fn predict(params: &FitParams, t: f64) -> f64 {
    params.a * (params.b * t).exp()
}

/// Model time `t` for `year`, measured from `base_year`.
///
/// The difference is taken in `i64`, so any pair of `i32` years is representable.
pub fn year_span(year: i32, base_year: i32) -> f64 {
    (i64::from(year) - i64::from(base_year)) as f64
}

/// Fill the Jacobian row `[∂f/∂a, ∂f/∂b] = [e^{bt}, a t e^{bt}]`.
pub fn fill_jacobian_row(params: &FitParams, t: f64, out: &mut [f64; 2]) {
    let e = (params.b * t).exp();
    out[0] = e;
    out[1] = params.a * t * e;
}

/// Doubling time in years, when the fit is growing.
pub fn doubling_time(params: &FitParams) -> Option<f64> {
    if params.b > 0.0 && params.b.is_finite() {
        Some(std::f64::consts::LN_2 / params.b)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn predict_at_zero_is_amplitude() {
        let p = FitParams { a: 123.0, b: 0.7 };
        assert_eq!(predict(&p, 0.0), 123.0);
    }

    #[test]
    fn jacobian_matches_finite_difference() {
        let p = FitParams { a: 10.0, b: 0.2 };
        let t = 3.0;
        let mut row = [0.0; 2];
        fill_jacobian_row(&p, t, &mut row);

        let h = 1e-6;
        let da = (predict(&FitParams { a: p.a + h, ..p }, t) - predict(&FitParams { a: p.a - h, ..p }, t)) / (2.0 * h);
        let db = (predict(&FitParams { b: p.b + h, ..p }, t) - predict(&FitParams { b: p.b - h, ..p }, t)) / (2.0 * h);
        assert!((row[0] - da).abs() < 1e-6);
        assert!((row[1] - db).abs() < 1e-4);
    }

    #[test]
    fn year_span_covers_the_full_year_range() {
        assert_eq!(year_span(2024, 2018), 6.0);
        assert_eq!(year_span(2018, 2024), -6.0);
        assert_eq!(year_span(i32::MAX, i32::MIN), 4_294_967_295.0);
    }

    #[test]
    fn doubling_time_only_for_growth() {
        let growing = FitParams { a: 1.0, b: std::f64::consts::LN_2 };
        assert!((doubling_time(&growing).unwrap() - 1.0).abs() < 1e-12);
        assert!(doubling_time(&FitParams { a: 1.0, b: 0.0 }).is_none());
    }
}
