//! Reporting utilities: outcome counts, candidate rankings, and the saved report.

pub mod format;

pub use format::*;

use chrono::{DateTime, Utc};

use crate::app::pipeline::RunOutput;
use crate::domain::{
    Assignment, AssignmentSummary, CandidateScore, CandidateSet, CurveSamples, MatchReport, Outcome, ReportInputs,
    SeriesId, TrainingSet,
};
use crate::fit::score_candidates;

/// Full candidate ranking for one training series (best first).
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesScores {
    pub training_id: SeriesId,
    pub training_label: String,
    pub scores: Vec<CandidateScore>,
}

/// Count outcomes over an assignment table.
pub fn summarize(assignments: &[Assignment]) -> AssignmentSummary {
    let mut summary = AssignmentSummary {
        total: assignments.len(),
        ..AssignmentSummary::default()
    };
    for a in assignments {
        match a.outcome {
            Outcome::Matched => {
                summary.matched += 1;
                if let Some(id) = a.matched_candidate_id {
                    *summary.per_candidate.entry(id).or_default() += 1;
                }
            }
            Outcome::UnmappableDomain => summary.unmappable += 1,
            Outcome::NoQualifyingFit => summary.no_fit += 1,
        }
    }
    summary
}

/// Rank every candidate against every training series.
pub fn rank_candidates(training: &TrainingSet, candidates: &CandidateSet) -> Vec<SeriesScores> {
    training
        .iter()
        .map(|(training_id, series)| SeriesScores {
            training_id,
            training_label: series.label.clone(),
            scores: score_candidates(series, candidates),
        })
        .collect()
}

/// Build the saved report for a finished run.
pub fn build_report(run: &RunOutput) -> MatchReport {
    build_report_at(run, Utc::now())
}

pub fn build_report_at(run: &RunOutput, generated_at: DateTime<Utc>) -> MatchReport {
    let candidates = &run.datasets.candidates.set;
    let curves = run
        .selection
        .fits
        .iter()
        .filter_map(|fit| {
            candidates.get(fit.candidate_id).map(|c| CurveSamples {
                training_id: fit.training_id,
                candidate_id: fit.candidate_id,
                label: c.label.clone(),
                x: c.x().to_vec(),
                y: c.y().to_vec(),
            })
        })
        .collect();

    MatchReport {
        tool: "ideal".to_string(),
        generated_at,
        inputs: ReportInputs {
            training: run.datasets.training.source.clone(),
            candidates: run.datasets.candidates.source.clone(),
            test: run.datasets.test.source.clone(),
        },
        fits: run.selection.fits.clone(),
        rejected: run.selection.rejected.clone(),
        assignments: run.assignments.clone(),
        row_errors: run.datasets.test.row_errors.clone(),
        summary: run.summary.clone(),
        curves,
    }
}
