//! Grouping and aggregation over a cleaned dataset.
//!
//! - `yearly_counts` is the contract the forecaster consumes
//! - the remaining aggregates feed the exploratory summary report only

pub mod counts;
pub mod means;

pub use counts::*;
pub use means::*;
