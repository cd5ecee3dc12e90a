//! Debug bundle writer for inspecting a run's full candidate scoring.

use std::fs::create_dir_all;
use std::path::{Path, PathBuf};

use chrono::Local;
use tracing::info;

use crate::app::pipeline::RunOutput;
use crate::error::AppError;
use crate::report::rank_candidates;

/// Write a timestamped markdown bundle into `dir`; returns the file path.
pub fn write_debug_bundle(run: &RunOutput, dir: &Path) -> Result<PathBuf, AppError> {
    create_dir_all(dir)
        .map_err(|e| AppError::new(4, format!("Failed to create debug dir: {e}")))?;

    let ts = Local::now().format("%Y%m%d_%H%M%S");
    let path = dir.join(format!("ideal_debug_{ts}.md"));

    std::fs::write(&path, render_debug_bundle(run))
        .map_err(|e| AppError::new(4, format!("Failed to write debug file: {e}")))?;
    info!(path = %path.display(), "wrote debug bundle");
    Ok(path)
}

/// Markdown body of the bundle.
pub fn render_debug_bundle(run: &RunOutput) -> String {
    let d = &run.datasets;
    let mut out = String::new();

    out.push_str("# ideal debug bundle\n");
    out.push_str(&format!("- generated: {}\n", Local::now().to_rfc3339()));
    out.push_str(&format!(
        "- training: {} (series={}, samples={})\n",
        d.training.source, d.training.stats.n_series, d.training.stats.n_samples
    ));
    out.push_str(&format!(
        "- candidates: {} (series={}, samples={})\n",
        d.candidates.source, d.candidates.stats.n_series, d.candidates.stats.n_samples
    ));
    out.push_str(&format!(
        "- test: {} (points={}, skipped rows={})\n",
        d.test.source,
        d.test.points.len(),
        d.test.row_errors.len()
    ));
    for err in &d.test.row_errors {
        out.push_str(&format!("  - line {}: {}\n", err.line, err.message));
    }

    for ranked in rank_candidates(&d.training.set, &d.candidates.set) {
        out.push_str(&format!(
            "\n## Training {} (#{})\n",
            ranked.training_label, ranked.training_id
        ));
        match run.selection.fit_for(ranked.training_id) {
            Some(fit) => out.push_str(&format!(
                "Chosen: {} (#{}) sse={:.6} max_dev={:.6} tolerance={:.6}\n",
                fit.candidate_label, fit.candidate_id, fit.sum_squared_error, fit.max_abs_deviation, fit.tolerance
            )),
            None => {
                let reason = run
                    .selection
                    .rejected
                    .iter()
                    .find(|r| r.training_id == ranked.training_id)
                    .map_or("no fit", |r| r.reason.as_str());
                out.push_str(&format!("Rejected: {reason}\n"));
            }
        }

        out.push_str("\n| rank | candidate | id | sse |\n| - | - | - | - |\n");
        for (rank, score) in ranked.scores.iter().enumerate() {
            out.push_str(&format!(
                "| {} | {} | {} | {:.6} |\n",
                rank + 1,
                d.candidates.set.label(score.candidate_id),
                score.candidate_id,
                score.sum_squared_error
            ));
        }
    }

    out.push_str("\n## Assignments\n");
    out.push_str("| x | y | delta_y | candidate | training | outcome |\n| - | - | - | - | - | - |\n");
    for a in &run.assignments {
        out.push_str(&format!(
            "| {} | {} | {} | {} | {} | {} |\n",
            a.x,
            a.y,
            a.deviation.map(|v| format!("{v:.6}")).unwrap_or_default(),
            a.matched_candidate_id.map(|v| v.to_string()).unwrap_or_default(),
            a.matched_training_id.map(|v| v.to_string()).unwrap_or_default(),
            a.outcome.as_str()
        ));
    }

    out
}
