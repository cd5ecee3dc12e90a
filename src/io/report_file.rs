//! Read/write report JSON files.
//!
//! Report JSON is the portable record of a run: fits, rejected series, the
//! assignment table and the chosen candidates' samples, enough for
//! `ideal plot` to redraw it without the input tables.
//!
//! The schema is defined by `domain::MatchReport`.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use tracing::info;

use crate::domain::MatchReport;
use crate::error::AppError;
use crate::io::export::ResultSink;

/// Full report as pretty JSON.
#[derive(Debug, Clone)]
pub struct JsonSink {
    path: PathBuf,
}

impl JsonSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ResultSink for JsonSink {
    fn write(&mut self, report: &MatchReport) -> Result<(), AppError> {
        let file = File::create(&self.path)
            .map_err(|e| AppError::new(2, format!("Failed to create report JSON '{}': {e}", self.path.display())))?;
        serde_json::to_writer_pretty(file, report)
            .map_err(|e| AppError::new(2, format!("Failed to write report JSON: {e}")))?;
        info!(path = %self.path.display(), "wrote report JSON");
        Ok(())
    }
}

/// Read a report JSON file.
pub fn read_report_json(path: &Path) -> Result<MatchReport, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open report JSON '{}': {e}", path.display())))?;
    parse_report_json(BufReader::new(file))
}

pub fn parse_report_json<R: Read>(reader: R) -> Result<MatchReport, AppError> {
    serde_json::from_reader(reader).map_err(|e| AppError::new(2, format!("Invalid report JSON: {e}")))
}
