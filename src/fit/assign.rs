//! Test point assignment against the selected fits.
//!
//! Each point is decided independently:
//! - `x` outside the shared sample domain → `UnmappableDomain`
//! - otherwise the point qualifies for every fit with `|y - c(x)| <= tolerance`
//!   (inclusive), and the smallest deviation wins (ties → lowest training id)
//! - no qualifying fit → `NoQualifyingFit`
//!
//! Output order and length always equal the input.

use rayon::prelude::*;

use crate::domain::{Assignment, CandidateSet, Execution, Fit, Outcome, Series, SeriesKind, TestPoint};
use crate::error::FitError;

/// A fit paired with the candidate series it points at.
struct Resolved<'a> {
    fit: &'a Fit,
    candidate: &'a Series,
}

/// Assign every test point to at most one fit.
pub fn assign_test_points(
    fits: &[Fit],
    candidates: &CandidateSet,
    test_points: &[TestPoint],
    execution: Execution,
) -> Result<Vec<Assignment>, FitError> {
    let mut resolved = fits
        .iter()
        .map(|fit| {
            candidates
                .get(fit.candidate_id)
                .map(|candidate| Resolved { fit, candidate })
                .ok_or(FitError::UnknownCandidate {
                    candidate_id: fit.candidate_id,
                })
        })
        .collect::<Result<Vec<_>, _>>()?;
    // Scanning in training order makes "first strictly smaller" the tie-break.
    resolved.sort_by_key(|r| r.fit.training_id);

    let domain = candidates.first().map(|(_, s)| s);
    // Every fitted candidate is indexed by the shared domain's positions.
    if let Some(domain) = domain {
        if let Some(r) = resolved.iter().find(|r| !r.candidate.shares_domain_with(domain)) {
            return Err(FitError::DomainMismatch {
                kind: SeriesKind::Candidate,
                id: r.fit.candidate_id,
                label: r.candidate.label.clone(),
            });
        }
    }

    let assign = |p: &TestPoint| assign_point(*p, domain, &resolved);
    let out: Vec<Assignment> = match execution {
        Execution::Sequential => test_points.iter().map(assign).collect(),
        Execution::Parallel => test_points.par_iter().map(assign).collect(),
    };
    Ok(out)
}

fn assign_point(point: TestPoint, domain: Option<&Series>, fits: &[Resolved<'_>]) -> Assignment {
    let Some(index) = domain.and_then(|d| d.index_of(point.x)) else {
        return Assignment::unassigned(point, Outcome::UnmappableDomain);
    };

    let mut best: Option<(f64, &Fit)> = None;
    for r in fits {
        let d = (point.y - r.candidate.y()[index]).abs();
        // NaN compares false on both checks and never qualifies.
        if !(d <= r.fit.tolerance) {
            continue;
        }
        match best {
            Some((best_d, _)) if d >= best_d => {}
            _ => best = Some((d, r.fit)),
        }
    }

    match best {
        Some((d, fit)) => Assignment::matched(point, d, fit),
        None => Assignment::unassigned(point, Outcome::NoQualifyingFit),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{SeriesId, SeriesSet};

    fn line(label: &str, slope: f64) -> Series {
        let x = vec![0.0, 1.0, 2.0, 3.0];
        let y = x.iter().map(|v| v * slope).collect();
        Series::new(label, x, y).unwrap()
    }

    fn fit(training_id: SeriesId, candidate_id: SeriesId, tolerance: f64) -> Fit {
        Fit {
            training_id,
            training_label: format!("t{training_id}"),
            candidate_id,
            candidate_label: format!("y{candidate_id}"),
            sum_squared_error: 0.0,
            max_abs_deviation: tolerance / std::f64::consts::SQRT_2,
            tolerance,
        }
    }

    #[test]
    fn exact_point_matches_zero_tolerance_fit() {
        let candidates = SeriesSet::from_series([line("y1", 1.0), line("y2", 2.0)]);
        let fits = vec![fit(1, 1, 0.0)];
        let points = [TestPoint::new(2.0, 2.05), TestPoint::new(2.0, 2.0)];

        let out = assign_test_points(&fits, &candidates, &points, Execution::Sequential).unwrap();
        assert_eq!(out[0].outcome, Outcome::NoQualifyingFit);
        assert_eq!(out[0].deviation, None);
        assert_eq!(out[0].matched_candidate_id, None);

        assert_eq!(out[1].outcome, Outcome::Matched);
        assert_eq!(out[1].deviation, Some(0.0));
        assert_eq!(out[1].matched_candidate_id, Some(1));
        assert_eq!(out[1].matched_training_id, Some(1));
    }

    #[test]
    fn off_domain_x_is_unmappable() {
        let candidates = SeriesSet::from_series([line("y1", 1.0)]);
        let fits = vec![fit(1, 1, 100.0)];
        let points = [TestPoint::new(1.5, 1.5), TestPoint::new(f64::NAN, 0.0)];

        let out = assign_test_points(&fits, &candidates, &points, Execution::Sequential).unwrap();
        for a in &out {
            assert_eq!(a.outcome, Outcome::UnmappableDomain);
            assert_eq!(a.deviation, None);
            assert_eq!(a.matched_candidate_id, None);
        }
    }

    #[test]
    fn misaligned_candidate_is_a_domain_mismatch() {
        let wide = Series::new("y1", vec![0.0, 1.0, 2.0], vec![0.0, 1.0, 2.0]).unwrap();
        let short = Series::new("y2", vec![0.0], vec![0.0]).unwrap();
        let candidates = SeriesSet::from_series([wide, short]);
        let fits = vec![fit(1, 2, 10.0)];
        let points = [TestPoint::new(2.0, 2.0)];

        let err = assign_test_points(&fits, &candidates, &points, Execution::Parallel).unwrap_err();
        assert!(matches!(
            err,
            FitError::DomainMismatch {
                kind: SeriesKind::Candidate,
                id: 2,
                ..
            }
        ));
    }

    #[test]
    fn tolerance_boundary_is_inclusive() {
        let candidates = SeriesSet::from_series([line("y1", 1.0)]);
        let fits = vec![fit(1, 1, 0.5)];
        let points = [TestPoint::new(2.0, 2.5)];

        let out = assign_test_points(&fits, &candidates, &points, Execution::Sequential).unwrap();
        assert_eq!(out[0].outcome, Outcome::Matched);
        assert_eq!(out[0].deviation, Some(0.5));
    }

    #[test]
    fn smallest_deviation_wins() {
        let candidates = SeriesSet::from_series([line("y1", 1.0), line("y2", 2.0)]);
        let fits = vec![fit(1, 1, 10.0), fit(2, 2, 10.0)];
        // At x=2: |3.9 - 2| = 1.9 vs |3.9 - 4| = 0.1
        let points = [TestPoint::new(2.0, 3.9)];

        let out = assign_test_points(&fits, &candidates, &points, Execution::Sequential).unwrap();
        assert_eq!(out[0].matched_candidate_id, Some(2));
        assert_eq!(out[0].matched_training_id, Some(2));
    }

    #[test]
    fn equal_deviation_goes_to_lowest_training_id() {
        let candidates = SeriesSet::from_series([line("y1", 1.0), line("y2", 3.0)]);
        // Training 2 → candidate 1, training 1 → candidate 2; fits passed out of order.
        let fits = vec![fit(2, 1, 10.0), fit(1, 2, 10.0)];
        // At x=1: candidate 1 gives 1, candidate 2 gives 3; y=2 is equidistant.
        let points = [TestPoint::new(1.0, 2.0)];

        for execution in [Execution::Sequential, Execution::Parallel] {
            let out = assign_test_points(&fits, &candidates, &points, execution).unwrap();
            assert_eq!(out[0].matched_training_id, Some(1));
            assert_eq!(out[0].matched_candidate_id, Some(2));
        }
    }

    #[test]
    fn no_fits_means_no_qualifying_fit() {
        let candidates = SeriesSet::from_series([line("y1", 1.0)]);
        let out = assign_test_points(&[], &candidates, &[TestPoint::new(1.0, 1.0)], Execution::Sequential).unwrap();
        assert_eq!(out[0].outcome, Outcome::NoQualifyingFit);
    }

    #[test]
    fn unknown_candidate_is_an_error() {
        let candidates = SeriesSet::from_series([line("y1", 1.0)]);
        let err = assign_test_points(&[fit(1, 7, 1.0)], &candidates, &[], Execution::Sequential).unwrap_err();
        assert_eq!(err, FitError::UnknownCandidate { candidate_id: 7 });
    }

    #[test]
    fn preserves_order_and_count() {
        let candidates = SeriesSet::from_series([line("y1", 1.0)]);
        let fits = vec![fit(1, 1, 0.2)];
        let points: Vec<TestPoint> = (0..40)
            .map(|i| TestPoint::new((i % 5) as f64 * 0.75, i as f64 * 0.01))
            .collect();

        let seq = assign_test_points(&fits, &candidates, &points, Execution::Sequential).unwrap();
        let par = assign_test_points(&fits, &candidates, &points, Execution::Parallel).unwrap();
        assert_eq!(seq.len(), points.len());
        assert_eq!(seq, par);
        for (a, p) in seq.iter().zip(&points) {
            assert_eq!((a.x, a.y), (p.x, p.y));
        }
    }
}
