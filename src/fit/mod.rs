//! Growth curve fitting orchestration.
//!
//! Responsibilities:
//!
//! - build the deterministic start grid for `(a, b)`
//! - refine each start with Levenberg–Marquardt (parallel)
//! - pick the best converged fit and project the forecast horizon

pub mod forecaster;
pub mod solver;
pub mod start_grid;

pub use forecaster::*;
pub use solver::*;
pub use start_grid::*;
