//! CSV ingest for the three input tables.
//!
//! This module is responsible for turning wide CSV files into the in-memory
//! tables the engine consumes:
//!
//! - training / candidate tables: `x, y1, y2, ...` → one `Series` per column
//! - test table: `x, y` → an ordered list of `TestPoint`s
//!
//! Design goals:
//! - **Strict schema** for the series tables (clear errors + exit code 2)
//! - **Row-level validation** for test points (skip rows without a usable `x`, but report them)
//! - **Separation of concerns**: no fitting logic here

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::StringRecord;
use tracing::{info, warn};

pub use crate::domain::RowError;
use crate::domain::{MatchConfig, Series, SeriesSet, SeriesShapeError, TestPoint};
use crate::error::AppError;

/// Summary stats about a loaded series table.
#[derive(Debug, Clone, PartialEq)]
pub struct TableStats {
    pub n_series: usize,
    pub n_samples: usize,
    pub x_min: f64,
    pub x_max: f64,
}

/// A loaded training or candidate table.
#[derive(Debug, Clone)]
pub struct LoadedTable {
    pub set: SeriesSet,
    pub stats: TableStats,
    /// Where the table came from (file path or a caller-supplied name).
    pub source: String,
}

/// Loaded test points plus the rows that could not be used.
#[derive(Debug, Clone)]
pub struct LoadedTestPoints {
    pub points: Vec<TestPoint>,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
    pub source: String,
}

/// All three inputs of a run.
#[derive(Debug, Clone)]
pub struct Datasets {
    pub training: LoadedTable,
    pub candidates: LoadedTable,
    pub test: LoadedTestPoints,
}

/// Load the training, candidate and test tables named in the config.
pub fn load_datasets(config: &MatchConfig) -> Result<Datasets, AppError> {
    let training = load_series_table(&config.train_path)?;
    let candidates = load_series_table(&config.ideal_path)?;
    let test = load_test_points(&config.test_path)?;
    Ok(Datasets {
        training,
        candidates,
        test,
    })
}

pub fn load_series_table(path: &Path) -> Result<LoadedTable, AppError> {
    let file = open(path)?;
    read_series_table(file, &path.display().to_string())
}

pub fn load_test_points(path: &Path) -> Result<LoadedTestPoints, AppError> {
    let file = open(path)?;
    read_test_points(file, &path.display().to_string())
}

fn open(path: &Path) -> Result<File, AppError> {
    File::open(path).map_err(|e| AppError::new(2, format!("Failed to open CSV '{}': {e}", path.display())))
}

/// Parse a wide series table from any reader.
///
/// Every non-`x` column becomes a series; ids follow column order (`1..=n`).
pub fn read_series_table<R: Read>(reader: R, source: &str) -> Result<LoadedTable, AppError> {
    let mut reader = csv_reader(reader);
    let headers = read_headers(&mut reader, source)?;
    let header_map = build_header_map(&headers);

    let x_idx = *header_map
        .get("x")
        .ok_or_else(|| AppError::new(2, format!("{source}: missing required column `x`")))?;
    let columns: Vec<(usize, String)> = headers
        .iter()
        .enumerate()
        .filter(|(idx, _)| *idx != x_idx)
        .map(|(idx, name)| (idx, normalize_header_name(name)))
        .collect();
    if columns.is_empty() {
        return Err(AppError::new(2, format!("{source}: no series columns besides `x`")));
    }

    let mut xs = Vec::new();
    let mut ys: Vec<Vec<f64>> = vec![Vec::new(); columns.len()];

    for (idx, result) in reader.records().enumerate() {
        // +2 because:
        // - records() starts at line 1 after headers
        // - CSV is 1-based line numbers
        let line = idx + 2;
        let record = result.map_err(|e| AppError::new(2, format!("{source}:{line}: CSV parse error: {e}")))?;

        if record.len() != headers.len() {
            return Err(AppError::new(
                2,
                format!(
                    "{source}:{line}: expected {} fields, found {}",
                    headers.len(),
                    record.len()
                ),
            ));
        }

        let x = parse_cell(record.get(x_idx))
            .filter(|v| v.is_finite())
            .ok_or_else(|| AppError::new(2, format!("{source}:{line}: `x` must be a finite number")))?;
        xs.push(x);

        for (slot, (col_idx, name)) in columns.iter().enumerate() {
            let value = parse_cell(record.get(*col_idx)).ok_or_else(|| {
                AppError::new(
                    2,
                    format!(
                        "{source}:{line}: invalid number '{}' in column `{name}`",
                        record.get(*col_idx).unwrap_or("")
                    ),
                )
            })?;
            ys[slot].push(value);
        }
    }

    let stats = TableStats {
        n_series: columns.len(),
        n_samples: xs.len(),
        x_min: xs.first().copied().unwrap_or(f64::NAN),
        x_max: xs.last().copied().unwrap_or(f64::NAN),
    };

    let mut series = Vec::with_capacity(columns.len());
    for ((_, name), y) in columns.into_iter().zip(ys) {
        let s = Series::new(name, xs.clone(), y).map_err(|e| shape_error(source, e))?;
        series.push(s);
    }

    info!(
        source,
        series = stats.n_series,
        samples = stats.n_samples,
        "loaded series table"
    );

    Ok(LoadedTable {
        set: SeriesSet::from_series(series),
        stats,
        source: source.to_string(),
    })
}

/// Parse a test table (`x`, `y` columns) from any reader.
///
/// Rows without a finite `x`, or with unparseable text in `y`, are skipped and
/// reported. An empty or `nan` `y` is kept as NaN; such a point never matches.
pub fn read_test_points<R: Read>(reader: R, source: &str) -> Result<LoadedTestPoints, AppError> {
    let mut reader = csv_reader(reader);
    let headers = read_headers(&mut reader, source)?;
    let header_map = build_header_map(&headers);

    let x_idx = *header_map
        .get("x")
        .ok_or_else(|| AppError::new(2, format!("{source}: missing required column `x`")))?;
    let y_idx = *header_map
        .get("y")
        .ok_or_else(|| AppError::new(2, format!("{source}: missing required column `y`")))?;

    let mut points = Vec::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;

    for (idx, result) in reader.records().enumerate() {
        let line = idx + 2;
        rows_read += 1;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                row_errors.push(RowError {
                    line,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };

        match parse_test_row(&record, x_idx, y_idx) {
            Ok(point) => points.push(point),
            Err(message) => row_errors.push(RowError { line, message }),
        }
    }

    for err in &row_errors {
        warn!(source, line = err.line, "skipping test row: {}", err.message);
    }
    info!(source, points = points.len(), skipped = row_errors.len(), "loaded test points");

    Ok(LoadedTestPoints {
        points,
        row_errors,
        rows_read,
        source: source.to_string(),
    })
}

fn parse_test_row(record: &StringRecord, x_idx: usize, y_idx: usize) -> Result<TestPoint, String> {
    let raw_x = record
        .get(x_idx)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| "Missing required value: `x`".to_string())?;
    let x = raw_x
        .parse::<f64>()
        .map_err(|_| format!("Invalid number '{raw_x}' in column `x`"))?;
    if !x.is_finite() {
        return Err("Non-finite value in column `x`".to_string());
    }

    let y = parse_cell(record.get(y_idx)).ok_or_else(|| {
        format!(
            "Invalid number '{}' in column `y`",
            record.get(y_idx).unwrap_or("")
        )
    })?;
    Ok(TestPoint::new(x, y))
}

fn csv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader)
}

fn read_headers<R: Read>(reader: &mut csv::Reader<R>, source: &str) -> Result<StringRecord, AppError> {
    reader
        .headers()
        .map(|h| h.clone())
        .map_err(|e| AppError::new(2, format!("{source}: failed to read CSV headers: {e}")))
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Excel and other tools sometimes emit UTF-8 CSVs with a BOM prefix on the
    // first header. If we don't strip it, the `x` column is reported missing.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

/// Parse a series cell. Empty cells and `nan` become NaN; garbage is `None`.
fn parse_cell(s: Option<&str>) -> Option<f64> {
    let s = s?.trim();
    if s.is_empty() {
        return Some(f64::NAN);
    }
    s.parse::<f64>().ok()
}

fn shape_error(source: &str, err: SeriesShapeError) -> AppError {
    let line = match &err {
        SeriesShapeError::NonFiniteX { index } | SeriesShapeError::NotAscending { index } => Some(index + 2),
        SeriesShapeError::LengthMismatch { .. } => None,
    };
    match line {
        Some(line) => AppError::new(2, format!("{source}:{line}: {err}")),
        None => AppError::new(2, format!("{source}: {err}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_wide_table_with_ids_by_column_order() {
        let csv = "X,y1,Y2\n0,1,10\n1,2,20\n2,3,30\n";
        let table = read_series_table(csv.as_bytes(), "train").unwrap();
        assert_eq!(table.stats.n_series, 2);
        assert_eq!(table.stats.n_samples, 3);
        assert_eq!(table.stats.x_min, 0.0);
        assert_eq!(table.stats.x_max, 2.0);

        let y2 = table.set.get(2).unwrap();
        assert_eq!(y2.label, "y2");
        assert_eq!(y2.y(), &[10.0, 20.0, 30.0]);
        assert_eq!(y2.x(), &[0.0, 1.0, 2.0]);
    }

    #[test]
    fn x_column_may_be_anywhere_and_bom_is_stripped() {
        let csv = "\u{feff}a,x,b\n5,0,6\n7,1,8\n";
        let table = read_series_table(csv.as_bytes(), "t").unwrap();
        assert_eq!(table.set.get(1).unwrap().label, "a");
        assert_eq!(table.set.get(2).unwrap().y(), &[6.0, 8.0]);
    }

    #[test]
    fn empty_cells_become_nan() {
        let csv = "x,y1\n0,\n1,2\n";
        let table = read_series_table(csv.as_bytes(), "t").unwrap();
        assert!(table.set.get(1).unwrap().y()[0].is_nan());
    }

    #[test]
    fn garbage_cell_reports_line() {
        let csv = "x,y1\n0,1\n1,abc\n";
        let err = read_series_table(csv.as_bytes(), "t").unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(err.message().starts_with("t:3:"), "{}", err.message());
    }

    #[test]
    fn unordered_x_reports_line() {
        let csv = "x,y1\n0,1\n2,1\n1,1\n";
        let err = read_series_table(csv.as_bytes(), "t").unwrap_err();
        assert!(err.message().starts_with("t:4:"), "{}", err.message());
    }

    #[test]
    fn missing_x_column_is_schema_error() {
        let err = read_series_table("a,b\n1,2\n".as_bytes(), "t").unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_points_skip_bad_rows() {
        let csv = "x,y,note\n1,2,a\n,3,b\n2,oops,c\n4,5,d\nnan,1,e\n";
        let loaded = read_test_points(csv.as_bytes(), "test").unwrap();
        assert_eq!(loaded.rows_read, 5);
        assert_eq!(loaded.points, vec![TestPoint::new(1.0, 2.0), TestPoint::new(4.0, 5.0)]);
        let lines: Vec<_> = loaded.row_errors.iter().map(|e| e.line).collect();
        assert_eq!(lines, vec![3, 4, 6]);
    }

    #[test]
    fn test_points_keep_missing_or_nan_y() {
        let csv = "x,y\n1,1\n2,nan\n3,\n,3\n";
        let loaded = read_test_points(csv.as_bytes(), "test").unwrap();
        assert_eq!(loaded.rows_read, 4);
        let xs: Vec<f64> = loaded.points.iter().map(|p| p.x).collect();
        assert_eq!(xs, vec![1.0, 2.0, 3.0]);
        assert!(loaded.points[1].y.is_nan());
        assert!(loaded.points[2].y.is_nan());
        assert_eq!(loaded.row_errors.len(), 1);
        assert_eq!(loaded.points.len() + loaded.row_errors.len(), loaded.rows_read);
    }
}
