//! Input/output helpers.
//!
//! - CSV ingest + cleaning (`ingest`)
//! - actual/forecast series export to CSV (`export`)
//! - forecast JSON read/write (`forecast_file`)

pub mod export;
pub mod forecast_file;
pub mod ingest;

pub use export::*;
pub use forecast_file::*;
pub use ingest::*;
