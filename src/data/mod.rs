//! Data sources beyond user-supplied CSV files.
//!
//! - `synthetic`: seeded demo datasets for `ideal generate`

pub mod synthetic;

pub use synthetic::*;
