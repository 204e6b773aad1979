//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - raw and cleaned registration data (`RawTable`, `CleanedDataset`)
//! - the yearly count series that feeds the forecaster (`YearlyCounts`)
//! - forecast configuration and outputs (`ForecastConfig`, `ForecastOutcome`, etc.)

pub mod types;

pub use types::*;
