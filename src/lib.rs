//! `ev-forecast` library crate.
//!
//! The binary (`evf`) is a thin wrapper around this library so that:
//!
//! - the ingest, aggregation and fitting code is testable without spawning processes
//! - the forecaster can be reused with other count series
//!
//! Data flow: CSV -> [`io::ingest`] -> [`aggregate::yearly_counts`] ->
//! [`fit::forecast_growth`] -> reports, plots, exports.

pub mod aggregate;
pub mod app;
pub mod cli;
pub mod data;
pub mod debug;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod math;
pub mod models;
pub mod plot;
pub mod report;
pub mod tui;
