//! Mathematical utilities: linear least squares seeds for the growth fit.

pub mod ols;

pub use ols::*;
