//! `ideal-fit` library crate.
//!
//! The binary (`ideal`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes
//! - the selection/assignment engine is reusable from other front-ends
//!
//! The engine itself lives in [`fit`]: [`fit::select_best_fits`] picks the
//! least-squares candidate per training series, and
//! [`fit::assign_test_points`] maps test points onto those choices.

pub mod app;
pub mod cli;
pub mod data;
pub mod debug;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod math;
pub mod plot;
pub mod report;
pub mod tui;
