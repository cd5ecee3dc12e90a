//! Shared "match pipeline" logic used by both CLI and TUI front-ends.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! load tables -> select best fits -> assign test points -> summarize
//!
//! The CLI and the TUI can then focus on presentation (printing vs widgets).

use tracing::info;

use crate::domain::{Assignment, AssignmentSummary, Execution, MatchConfig};
use crate::error::AppError;
use crate::fit::{FitSelection, assign_test_points, select_best_fits};
use crate::io::ingest::{Datasets, load_datasets};

/// All computed outputs of a single `ideal match` run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub datasets: Datasets,
    pub selection: FitSelection,
    pub assignments: Vec<Assignment>,
    pub summary: AssignmentSummary,
}

/// Load the configured tables and run the full pipeline.
pub fn run_match(config: &MatchConfig) -> Result<RunOutput, AppError> {
    let datasets = load_datasets(config)?;
    run_match_with(datasets, config.execution)
}

/// Run the pipeline on already-loaded tables.
pub fn run_match_with(datasets: Datasets, execution: Execution) -> Result<RunOutput, AppError> {
    let selection = select_best_fits(&datasets.training.set, &datasets.candidates.set, execution)?;
    let assignments = assign_test_points(
        &selection.fits,
        &datasets.candidates.set,
        &datasets.test.points,
        execution,
    )?;
    let summary = crate::report::summarize(&assignments);

    info!(
        fits = selection.fits.len(),
        rejected = selection.rejected.len(),
        matched = summary.matched,
        unmappable = summary.unmappable,
        no_fit = summary.no_fit,
        "match run complete"
    );

    Ok(RunOutput {
        datasets,
        selection,
        assignments,
        summary,
    })
}
