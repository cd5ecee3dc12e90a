//! Best-candidate selection per training series (least squares).
//!
//! For every training series `t` we score each candidate `c` by
//! `SSE(t, c) = Σ (t.y_i - c.y_i)²`, pick the minimizer, and derive an
//! assignment tolerance `max_i |t.y_i - c*.y_i| * √2`.
//!
//! Selection rules:
//! 1. Structural preconditions (non-empty inputs, one shared x domain) are
//!    checked up front and abort the run.
//! 2. A training series with non-finite values is rejected on its own; the
//!    remaining series still produce fits.
//! 3. Candidates with a non-finite SSE are never eligible.
//! 4. Ties on SSE go to the lowest candidate id.

use rayon::prelude::*;
use tracing::{debug, warn};

use crate::domain::{
    CandidateScore, CandidateSet, Execution, Fit, RejectedSeries, Series, SeriesId, SeriesKind, TrainingSet,
};
use crate::error::FitError;
use crate::math::{max_abs_deviation, sum_squared_error, tolerance_for};

/// Output of fitting: one `Fit` per usable training series.
#[derive(Debug, Clone, PartialEq)]
pub struct FitSelection {
    /// Fits in ascending training id.
    pub fits: Vec<Fit>,
    /// Training series excluded because of invalid values (for diagnostics).
    pub rejected: Vec<RejectedSeries>,
}

impl FitSelection {
    pub fn fit_for(&self, training_id: SeriesId) -> Option<&Fit> {
        self.fits.iter().find(|f| f.training_id == training_id)
    }
}

/// Select the best candidate for every training series.
pub fn select_best_fits(
    training: &TrainingSet,
    candidates: &CandidateSet,
    execution: Execution,
) -> Result<FitSelection, FitError> {
    validate_inputs(training, candidates)?;

    let series: Vec<(SeriesId, &Series)> = training.iter().collect();
    let results: Vec<(SeriesId, &Series, Result<Fit, FitError>)> = match execution {
        Execution::Sequential => series
            .iter()
            .map(|&(id, t)| (id, t, fit_series(id, t, candidates, execution)))
            .collect(),
        Execution::Parallel => series
            .par_iter()
            .map(|&(id, t)| (id, t, fit_series(id, t, candidates, execution)))
            .collect(),
    };

    let mut fits = Vec::with_capacity(results.len());
    let mut rejected = Vec::new();
    for (id, t, result) in results {
        match result {
            Ok(fit) => {
                debug!(
                    training = %fit.training_label,
                    candidate = %fit.candidate_label,
                    sse = fit.sum_squared_error,
                    max_dev = fit.max_abs_deviation,
                    tolerance = fit.tolerance,
                    "selected candidate"
                );
                fits.push(fit);
            }
            Err(err) if err.is_recoverable() => {
                warn!(training = %t.label, "excluding training series: {err}");
                rejected.push(RejectedSeries {
                    training_id: id,
                    training_label: t.label.clone(),
                    reason: err.to_string(),
                });
            }
            Err(err) => return Err(err),
        }
    }

    Ok(FitSelection { fits, rejected })
}

/// Score every candidate against one training series.
///
/// Returned ascending by `(SSE, candidate id)`; non-finite scores sort last.
pub fn score_candidates(training: &Series, candidates: &CandidateSet) -> Vec<CandidateScore> {
    let mut scores: Vec<CandidateScore> = candidates
        .iter()
        .map(|(id, c)| CandidateScore {
            candidate_id: id,
            sum_squared_error: sum_squared_error(training.y(), c.y()),
        })
        .collect();
    scores.sort_by(|a, b| {
        let ka = sort_key(a.sum_squared_error);
        let kb = sort_key(b.sum_squared_error);
        ka.total_cmp(&kb).then(a.candidate_id.cmp(&b.candidate_id))
    });
    scores
}

fn sort_key(sse: f64) -> f64 {
    if sse.is_finite() { sse } else { f64::INFINITY }
}

fn validate_inputs(training: &TrainingSet, candidates: &CandidateSet) -> Result<(), FitError> {
    let Some((_, reference)) = candidates.first() else {
        return Err(FitError::EmptyCandidateSet);
    };
    if training.is_empty() {
        return Err(FitError::EmptyTrainingSet);
    }
    if reference.is_empty() {
        return Err(FitError::EmptyDomain);
    }

    for (id, t) in training.iter() {
        check_domain(reference, SeriesKind::Training, id, t)?;
    }
    for (id, c) in candidates.iter() {
        check_domain(reference, SeriesKind::Candidate, id, c)?;
    }
    Ok(())
}

fn check_domain(reference: &Series, kind: SeriesKind, id: SeriesId, series: &Series) -> Result<(), FitError> {
    if series.shares_domain_with(reference) {
        Ok(())
    } else {
        Err(FitError::DomainMismatch {
            kind,
            id,
            label: series.label.clone(),
        })
    }
}

fn fit_series(
    training_id: SeriesId,
    training: &Series,
    candidates: &CandidateSet,
    execution: Execution,
) -> Result<Fit, FitError> {
    if let Some(i) = training.y().iter().position(|v| !v.is_finite()) {
        return Err(FitError::InvalidValue {
            training_id,
            reason: format!("non-finite y at x={}", training.x()[i]),
        });
    }

    let (candidate_id, sse) = best_candidate(training, candidates, execution).ok_or_else(|| FitError::InvalidValue {
        training_id,
        reason: "no candidate yields a finite sum of squared errors".to_string(),
    })?;

    // Present by construction: the id came from iterating `candidates`.
    let candidate = candidates
        .get(candidate_id)
        .ok_or(FitError::UnknownCandidate { candidate_id })?;

    let max_dev = max_abs_deviation(training.y(), candidate.y());
    let tolerance = tolerance_for(max_dev);
    if !tolerance.is_finite() {
        return Err(FitError::InvalidValue {
            training_id,
            reason: format!("tolerance overflow against candidate {}", candidate.label),
        });
    }

    Ok(Fit {
        training_id,
        training_label: training.label.clone(),
        candidate_id,
        candidate_label: candidate.label.clone(),
        sum_squared_error: sse,
        max_abs_deviation: max_dev,
        tolerance,
    })
}

/// Minimum finite SSE over all candidates; returns `(id, sse)`.
fn best_candidate(training: &Series, candidates: &CandidateSet, execution: Execution) -> Option<(SeriesId, f64)> {
    let score = |(id, c): (SeriesId, &Series)| {
        let sse = sum_squared_error(training.y(), c.y());
        sse.is_finite().then_some((id, sse))
    };

    match execution {
        Execution::Sequential => candidates.iter().filter_map(score).reduce(better),
        Execution::Parallel => {
            let all: Vec<(SeriesId, &Series)> = candidates.iter().collect();
            all.into_par_iter().filter_map(score).reduce_with(better)
        }
    }
}

/// Deterministic reduction: lower SSE wins, ties go to the lower id.
///
/// Associative and commutative, so the rayon reduction order does not matter.
fn better(a: (SeriesId, f64), b: (SeriesId, f64)) -> (SeriesId, f64) {
    if b.1 < a.1 || (b.1 == a.1 && b.0 < a.0) { b } else { a }
}
