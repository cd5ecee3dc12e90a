//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the fitting code stays clean and testable
//! - output changes are localized

use crate::domain::{Assignment, AssignmentSummary, CandidateSet};
use crate::fit::FitSelection;
use crate::io::ingest::{Datasets, TableStats};
use crate::report::SeriesScores;

/// Format the full run summary (dataset stats + fit table + outcome counts).
pub fn format_run_summary(datasets: &Datasets, selection: &FitSelection, summary: &AssignmentSummary) -> String {
    let mut out = String::new();

    out.push_str("=== ideal - Ideal Function Matching ===\n");
    out.push_str(&format_table_stats("Training", &datasets.training.source, &datasets.training.stats));
    out.push_str(&format_table_stats(
        "Candidates",
        &datasets.candidates.source,
        &datasets.candidates.stats,
    ));
    out.push_str(&format!(
        "Test: {} | points={} skipped={}\n",
        datasets.test.source,
        datasets.test.points.len(),
        datasets.test.row_errors.len()
    ));

    out.push_str("\nChosen fits:\n");
    out.push_str(
        format!(
            "{:<16} {:<16} {:>14} {:>12} {:>12}",
            "training", "candidate", "sse", "max_dev", "tolerance"
        )
        .trim_end(),
    );
    out.push('\n');
    out.push_str(format!("{:-<16} {:-<16} {:-<14} {:-<12} {:-<12}", "", "", "", "", "").trim_end());
    out.push('\n');
    for fit in &selection.fits {
        out.push_str(
            format!(
                "{:<16} {:<16} {:>14.4} {:>12.4} {:>12.4}",
                truncate(&fit.training_label, 16),
                format!("{} (#{})", truncate(&fit.candidate_label, 10), fit.candidate_id),
                fit.sum_squared_error,
                fit.max_abs_deviation,
                fit.tolerance,
            )
            .trim_end(),
        );
        out.push('\n');
    }
    out.push_str(&format_rejected(selection));

    out.push_str("\nAssignments:\n");
    out.push_str(&format!(
        "total={} matched={} unmappable={} no_fit={}\n",
        summary.total, summary.matched, summary.unmappable, summary.no_fit
    ));
    for (candidate_id, n) in &summary.per_candidate {
        out.push_str(&format!("- candidate #{candidate_id}: {n}\n"));
    }

    out
}

/// One line per chosen fit, followed by the rejected training series.
pub fn format_fit_lines(selection: &FitSelection) -> String {
    let mut out = String::new();
    for fit in &selection.fits {
        out.push_str(&format!(
            "{} -> {} (#{}) sse={:.6} max_dev={:.6} tolerance={:.6}\n",
            fit.training_label,
            fit.candidate_label,
            fit.candidate_id,
            fit.sum_squared_error,
            fit.max_abs_deviation,
            fit.tolerance
        ));
    }
    out.push_str(&format_rejected(selection));
    out
}

fn format_rejected(selection: &FitSelection) -> String {
    selection
        .rejected
        .iter()
        .map(|r| format!("  (rejected {} #{}) {}\n", r.training_label, r.training_id, r.reason))
        .collect()
}

fn format_table_stats(name: &str, source: &str, stats: &TableStats) -> String {
    format!(
        "{name}: {source} | series={} samples={} | x=[{:.3}, {:.3}]\n",
        stats.n_series, stats.n_samples, stats.x_min, stats.x_max
    )
}

/// Format the first `top` assignment rows.
pub fn format_assignments(assignments: &[Assignment], top: usize) -> String {
    let mut out = String::new();
    out.push_str(
        format!(
            "{:>10} {:>10} {:>10} {:>9} {:>9} {:<18}",
            "x", "y", "delta_y", "candidate", "training", "outcome"
        )
        .trim_end(),
    );
    out.push('\n');
    out.push_str(format!("{:->10} {:->10} {:->10} {:->9} {:->9} {:-<18}", "", "", "", "", "", "").trim_end());
    out.push('\n');

    for a in assignments.iter().take(top) {
        out.push_str(
            format!(
                "{:>10.4} {:>10.4} {:>10} {:>9} {:>9} {:<18}",
                a.x,
                a.y,
                a.deviation.map(|d| format!("{d:.4}")).unwrap_or_else(|| "-".to_string()),
                opt_id(a.matched_candidate_id),
                opt_id(a.matched_training_id),
                a.outcome.as_str(),
            )
            .trim_end(),
        );
        out.push('\n');
    }
    if assignments.len() > top {
        out.push_str(&format!("... {} more\n", assignments.len() - top));
    }

    out
}

/// Format the top-N candidate ranking per training series.
pub fn format_scores(rankings: &[SeriesScores], candidates: &CandidateSet, top: usize) -> String {
    let mut out = String::new();
    for ranked in rankings {
        out.push_str(&format!("Candidates for {} (#{}):\n", ranked.training_label, ranked.training_id));
        for (rank, score) in ranked.scores.iter().take(top).enumerate() {
            out.push_str(&format!(
                "{:>3}. {:<16} #{:<4} SSE={:.4}\n",
                rank + 1,
                truncate(&candidates.label(score.candidate_id), 16),
                score.candidate_id,
                score.sum_squared_error
            ));
        }
        out.push('\n');
    }
    out
}

fn opt_id(id: Option<usize>) -> String {
    id.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}
