//! Mathematical utilities: pointwise deviation measures between aligned series.

pub mod deviation;

pub use deviation::*;
