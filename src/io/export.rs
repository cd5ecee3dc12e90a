//! Result sinks.
//!
//! A sink receives the finished `MatchReport` of a run. The CSV sink is meant
//! to be easy to consume in spreadsheets or downstream scripts; it carries one
//! row per test point in input order.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::info;

use crate::domain::{Assignment, MatchReport};
use crate::error::AppError;

/// Destination for a finished run.
pub trait ResultSink {
    fn write(&mut self, report: &MatchReport) -> Result<(), AppError>;
}

/// Assignment table as CSV.
#[derive(Debug, Clone)]
pub struct CsvSink {
    path: PathBuf,
}

impl CsvSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ResultSink for CsvSink {
    fn write(&mut self, report: &MatchReport) -> Result<(), AppError> {
        let file = File::create(&self.path)
            .map_err(|e| AppError::new(2, format!("Failed to create export CSV '{}': {e}", self.path.display())))?;
        let mut out = BufWriter::new(file);
        write_assignments_csv(&mut out, &report.assignments)?;
        out.flush()
            .map_err(|e| AppError::new(2, format!("Failed to flush export CSV: {e}")))?;
        info!(path = %self.path.display(), rows = report.assignments.len(), "wrote assignment CSV");
        Ok(())
    }
}

/// Write the assignment table to any writer.
///
/// Absent values (no deviation, no match) are empty cells.
pub fn write_assignments_csv<W: Write>(out: &mut W, assignments: &[Assignment]) -> Result<(), AppError> {
    writeln!(out, "x,y,delta_y,ideal_func_no,training_no,outcome")
        .map_err(|e| AppError::new(2, format!("Failed to write export CSV header: {e}")))?;

    for a in assignments {
        writeln!(
            out,
            "{},{},{},{},{},{}",
            a.x,
            a.y,
            a.deviation.map(|d| d.to_string()).unwrap_or_default(),
            a.matched_candidate_id.map(|id| id.to_string()).unwrap_or_default(),
            a.matched_training_id.map(|id| id.to_string()).unwrap_or_default(),
            a.outcome.as_str(),
        )
        .map_err(|e| AppError::new(2, format!("Failed to write export CSV row: {e}")))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Fit, Outcome, TestPoint};

    #[test]
    fn csv_rows_follow_input_order_with_empty_cells() {
        let fit = Fit {
            training_id: 2,
            training_label: "y2".to_string(),
            candidate_id: 17,
            candidate_label: "y17".to_string(),
            sum_squared_error: 0.5,
            max_abs_deviation: 0.25,
            tolerance: 0.25 * std::f64::consts::SQRT_2,
        };
        let assignments = vec![
            Assignment::matched(TestPoint::new(1.5, 2.0), 0.125, &fit),
            Assignment::unassigned(TestPoint::new(-3.0, 4.0), Outcome::NoQualifyingFit),
            Assignment::unassigned(TestPoint::new(0.05, 1.0), Outcome::UnmappableDomain),
        ];

        let mut buf = Vec::new();
        write_assignments_csv(&mut buf, &assignments).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                "x,y,delta_y,ideal_func_no,training_no,outcome",
                "1.5,2,0.125,17,2,matched",
                "-3,4,,,,no_qualifying_fit",
                "0.05,1,,,,unmappable_domain",
            ]
        );
    }
}
