//! Terminal plots of actual vs forecast registrations.

pub mod ascii;

pub use ascii::*;
