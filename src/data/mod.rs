//! Data sources other than user-supplied CSV files.
//!
//! Currently just the seeded synthetic registration generator used by
//! `evf sample` and by tests.

pub mod sample;

pub use sample::*;
