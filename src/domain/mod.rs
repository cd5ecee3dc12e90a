//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - sampled series and the tables they live in (`Series`, `SeriesSet`)
//! - test observations (`TestPoint`)
//! - engine outputs (`Fit`, `Assignment`, `Outcome`)
//! - the run configuration (`MatchConfig`)

pub mod types;

pub use types::*;
