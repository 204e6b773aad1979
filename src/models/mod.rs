//! Growth model implementation.
//!
//! The model is implemented as small, pure functions so that the solver and
//! the presentation code share one definition of `f(t)`.

pub mod model;

pub use model::*;
