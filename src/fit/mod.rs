//! Fit selection and test point assignment.
//!
//! Responsibilities:
//!
//! - score every candidate against each training series (parallel, deterministic)
//! - derive the per-series assignment tolerance
//! - assign test points to the chosen candidates

pub mod assign;
pub mod selection;

pub use assign::*;
pub use selection::*;
