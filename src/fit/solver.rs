//! Levenberg–Marquardt refinement of a single starting point.
//!
//! Given:
//! - offsets `t_i` (years since the base year)
//! - observed counts `y_i`
//! - a start `(a0, b0)`
//!
//! we minimise `Σ (a e^{b t_i} - y_i)^2` with the `levenberg-marquardt` crate
//! and report how the run ended. Residuals and Jacobian entries that overflow
//! are reported to the solver as a failed evaluation, so a diverging start
//! terminates instead of propagating infinities.

use levenberg_marquardt::{LeastSquaresProblem, LevenbergMarquardt};
use log::debug;
use nalgebra::storage::Owned;
use nalgebra::{DVector, Dyn, OMatrix, U2, Vector2};

use crate::domain::{FitParams, StartOutcome};
use crate::fit::start_grid::StartPoint;
use crate::models::{fill_jacobian_row, predict};

struct GrowthProblem<'a> {
    t: &'a [f64],
    y: &'a [f64],
    p: Vector2<f64>,
}

impl GrowthProblem<'_> {
    fn current(&self) -> FitParams {
        FitParams {
            a: self.p[0],
            b: self.p[1],
        }
    }
}

impl LeastSquaresProblem<f64, Dyn, U2> for GrowthProblem<'_> {
    type ResidualStorage = Owned<f64, Dyn>;
    type JacobianStorage = Owned<f64, Dyn, U2>;
    type ParameterStorage = Owned<f64, U2>;

    fn set_params(&mut self, p: &Vector2<f64>) {
        self.p.copy_from(p);
    }

    fn params(&self) -> Vector2<f64> {
        self.p
    }

    fn residuals(&self) -> Option<DVector<f64>> {
        let params = self.current();
        let r = DVector::from_iterator(
            self.t.len(),
            self.t.iter().zip(self.y.iter()).map(|(&t, &y)| predict(&params, t) - y),
        );
        r.iter().all(|v| v.is_finite()).then_some(r)
    }

    fn jacobian(&self) -> Option<OMatrix<f64, Dyn, U2>> {
        let params = self.current();
        let mut jac = OMatrix::<f64, Dyn, U2>::zeros_generic(Dyn(self.t.len()), U2);
        let mut row = [0.0; 2];
        for (i, &t) in self.t.iter().enumerate() {
            fill_jacobian_row(&params, t, &mut row);
            jac[(i, 0)] = row[0];
            jac[(i, 1)] = row[1];
        }
        jac.iter().all(|v| v.is_finite()).then_some(jac)
    }
}

/// Refine one start and summarise the result.
///
/// `patience` bounds the work: the solver gives up after
/// `patience * 3` residual evaluations and reports a non-converged outcome.
pub fn refine(start: &StartPoint, t: &[f64], y: &[f64], patience: usize) -> StartOutcome {
    let problem = GrowthProblem {
        t,
        y,
        p: Vector2::new(start.a0, start.b0),
    };

    let (problem, report) = LevenbergMarquardt::new()
        .with_patience(patience.max(1))
        .minimize(problem);

    let params = problem.current();
    let finite = params.a.is_finite() && params.b.is_finite();
    let sse = if finite { sum_squared_residuals(&params, t, y) } else { f64::NAN };
    let converged = report.termination.was_successful() && finite && sse.is_finite();

    debug!(
        "start #{} (a0={:.6e}, b0={:.4}) -> {:?} after {} evals, a={:.6e} b={:.6} sse={:.6e}",
        start.index,
        start.a0,
        start.b0,
        report.termination,
        report.number_of_evaluations,
        params.a,
        params.b,
        sse
    );

    StartOutcome {
        index: start.index,
        a0: start.a0,
        b0: start.b0,
        converged,
        termination: format!("{:?}", report.termination),
        evaluations: report.number_of_evaluations,
        sse,
        params: finite.then_some(params),
    }
}

/// `Σ (f(t_i) - y_i)^2` for the given parameters.
pub fn sum_squared_residuals(params: &FitParams, t: &[f64], y: &[f64]) -> f64 {
    t.iter()
        .zip(y.iter())
        .map(|(&ti, &yi)| {
            let r = predict(params, ti) - yi;
            r * r
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refine_converges_from_nearby_start() {
        let t: Vec<f64> = (0..8).map(f64::from).collect();
        let y: Vec<f64> = t.iter().map(|&ti| 20.0 * (0.4 * ti).exp()).collect();
        let start = StartPoint {
            index: 0,
            a0: 15.0,
            b0: 0.3,
        };

        let out = refine(&start, &t, &y, 200);
        assert!(out.converged, "termination: {}", out.termination);
        let p = out.params.unwrap();
        assert!((p.a - 20.0).abs() / 20.0 < 1e-6);
        assert!((p.b - 0.4).abs() / 0.4 < 1e-6);
        assert!(out.sse < 1e-12);
    }

    #[test]
    fn zero_residual_start_terminates_successfully() {
        let t = [0.0, 1.0, 2.0];
        let y = [0.0, 0.0, 0.0];
        let start = StartPoint {
            index: 0,
            a0: 0.0,
            b0: 0.1,
        };
        let out = refine(&start, &t, &y, 10);
        assert!(out.converged, "termination: {}", out.termination);
        assert_eq!(out.sse, 0.0);
        assert_eq!(out.params.unwrap().a, 0.0);
    }
}
