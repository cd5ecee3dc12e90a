//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory during fitting and assignment
//! - exported to JSON/CSV
//! - reloaded later for plotting

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier of a series inside a table (1-based, by column order).
pub type SeriesId = usize;

/// Which table a series came from (used in error messages).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeriesKind {
    Training,
    Candidate,
}

impl SeriesKind {
    pub fn display_name(self) -> &'static str {
        match self {
            SeriesKind::Training => "training",
            SeriesKind::Candidate => "candidate",
        }
    }
}

impl std::fmt::Display for SeriesKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Why a `Series` could not be constructed.
#[derive(Debug, Clone, PartialEq)]
pub enum SeriesShapeError {
    LengthMismatch { x: usize, y: usize },
    NonFiniteX { index: usize },
    NotAscending { index: usize },
}

impl std::fmt::Display for SeriesShapeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SeriesShapeError::LengthMismatch { x, y } => {
                write!(f, "x and y lengths differ ({x} vs {y})")
            }
            SeriesShapeError::NonFiniteX { index } => write!(f, "non-finite x at sample {index}"),
            SeriesShapeError::NotAscending { index } => {
                write!(f, "x is not strictly ascending at sample {index}")
            }
        }
    }
}

/// An ordered sequence of `(x, y)` samples with strictly ascending `x`.
///
/// Stored column-wise so domain comparisons and SSE loops run over plain slices.
/// `y` may contain non-finite values; the fit selector decides what to do with them.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub label: String,
    x: Vec<f64>,
    y: Vec<f64>,
}

impl Series {
    pub fn new(label: impl Into<String>, x: Vec<f64>, y: Vec<f64>) -> Result<Self, SeriesShapeError> {
        if x.len() != y.len() {
            return Err(SeriesShapeError::LengthMismatch {
                x: x.len(),
                y: y.len(),
            });
        }
        for (i, v) in x.iter().enumerate() {
            if !v.is_finite() {
                return Err(SeriesShapeError::NonFiniteX { index: i });
            }
            if i > 0 && *v <= x[i - 1] {
                return Err(SeriesShapeError::NotAscending { index: i });
            }
        }
        Ok(Self {
            label: label.into(),
            x,
            y,
        })
    }

    pub fn x(&self) -> &[f64] {
        &self.x
    }

    pub fn y(&self) -> &[f64] {
        &self.y
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// Iterate over `(x, y)` pairs in ascending `x`.
    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.x.iter().copied().zip(self.y.iter().copied())
    }

    /// Sample index of an exact `x` value, if present.
    ///
    /// NaN never matches.
    pub fn index_of(&self, x: f64) -> Option<usize> {
        if !x.is_finite() {
            return None;
        }
        self.x.binary_search_by(|v| v.total_cmp(&x)).ok().or_else(|| {
            // `total_cmp` orders -0.0 before 0.0; both are the same sample point.
            if x == 0.0 {
                self.x.iter().position(|&v| v == 0.0)
            } else {
                None
            }
        })
    }

    /// `y` at an exact sample `x` (no interpolation).
    pub fn y_at(&self, x: f64) -> Option<f64> {
        self.index_of(x).map(|i| self.y[i])
    }

    pub fn shares_domain_with(&self, other: &Series) -> bool {
        self.x == other.x
    }
}

/// Ordered mapping from series id to series (ascending id).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeriesSet {
    series: BTreeMap<SeriesId, Series>,
}

pub type TrainingSet = SeriesSet;
pub type CandidateSet = SeriesSet;

impl SeriesSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set with ids `1..=n` in iteration order.
    pub fn from_series(series: impl IntoIterator<Item = Series>) -> Self {
        let series = series
            .into_iter()
            .enumerate()
            .map(|(i, s)| (i + 1, s))
            .collect();
        Self { series }
    }

    pub fn insert(&mut self, id: SeriesId, series: Series) -> Option<Series> {
        self.series.insert(id, series)
    }

    pub fn get(&self, id: SeriesId) -> Option<&Series> {
        self.series.get(&id)
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (SeriesId, &Series)> + '_ {
        self.series.iter().map(|(id, s)| (*id, s))
    }

    pub fn ids(&self) -> impl Iterator<Item = SeriesId> + '_ {
        self.series.keys().copied()
    }

    /// The lowest-id series (the reference for the shared domain).
    pub fn first(&self) -> Option<(SeriesId, &Series)> {
        self.series.iter().next().map(|(id, s)| (*id, s))
    }

    pub fn label(&self, id: SeriesId) -> String {
        self.get(id)
            .map(|s| s.label.clone())
            .unwrap_or_else(|| format!("#{id}"))
    }
}

/// A single test observation. `y` may be non-finite (it then never matches).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TestPoint {
    pub x: f64,
    #[serde(with = "finite_or_null")]
    pub y: f64,
}

impl TestPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Best candidate for one training series, with its assignment tolerance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fit {
    pub training_id: SeriesId,
    pub training_label: String,
    pub candidate_id: SeriesId,
    pub candidate_label: String,
    pub sum_squared_error: f64,
    pub max_abs_deviation: f64,
    pub tolerance: f64,
}

/// SSE of one candidate against one training series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CandidateScore {
    pub candidate_id: SeriesId,
    pub sum_squared_error: f64,
}

/// A training series excluded from assignment, with the reason.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectedSeries {
    pub training_id: SeriesId,
    pub training_label: String,
    pub reason: String,
}

/// How a test point was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Matched,
    /// The point's `x` is not a sample of the shared domain.
    UnmappableDomain,
    /// No chosen candidate lies within its tolerance of the point.
    NoQualifyingFit,
}

impl Outcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::Matched => "matched",
            Outcome::UnmappableDomain => "unmappable_domain",
            Outcome::NoQualifyingFit => "no_qualifying_fit",
        }
    }
}

/// Assignment decision for one test point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub x: f64,
    #[serde(with = "finite_or_null")]
    pub y: f64,
    pub deviation: Option<f64>,
    pub matched_candidate_id: Option<SeriesId>,
    pub matched_training_id: Option<SeriesId>,
    pub outcome: Outcome,
}

impl Assignment {
    pub fn matched(point: TestPoint, deviation: f64, fit: &Fit) -> Self {
        Self {
            x: point.x,
            y: point.y,
            deviation: Some(deviation),
            matched_candidate_id: Some(fit.candidate_id),
            matched_training_id: Some(fit.training_id),
            outcome: Outcome::Matched,
        }
    }

    pub fn unassigned(point: TestPoint, outcome: Outcome) -> Self {
        Self {
            x: point.x,
            y: point.y,
            deviation: None,
            matched_candidate_id: None,
            matched_training_id: None,
            outcome,
        }
    }

    pub fn is_matched(&self) -> bool {
        self.outcome == Outcome::Matched
    }
}

/// Whether the core runs its independent units on the rayon pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Execution {
    Sequential,
    #[default]
    Parallel,
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus env/defaults).
#[derive(Debug, Clone)]
pub struct MatchConfig {
    pub train_path: PathBuf,
    pub ideal_path: PathBuf,
    pub test_path: PathBuf,
    pub execution: Execution,

    /// Rows shown in the terminal assignment table.
    pub top_n: usize,
    pub plot: bool,
    pub plot_width: usize,
    pub plot_height: usize,

    pub export_csv: Option<PathBuf>,
    pub export_json: Option<PathBuf>,
    /// Directory for the markdown debug bundle (written only when set).
    pub debug_dir: Option<PathBuf>,
}

/// Outcome counts over an assignment table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentSummary {
    pub total: usize,
    pub matched: usize,
    pub unmappable: usize,
    pub no_fit: usize,
    /// Matched points per candidate id.
    pub per_candidate: BTreeMap<SeriesId, usize>,
}

/// Samples of a chosen candidate, stored so a report can be plotted standalone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurveSamples {
    pub training_id: SeriesId,
    pub candidate_id: SeriesId,
    pub label: String,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

/// Where the three input tables came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportInputs {
    pub training: String,
    pub candidates: String,
    pub test: String,
}

/// An input row that could not become a test point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

/// A saved run (JSON).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchReport {
    pub tool: String,
    pub generated_at: DateTime<Utc>,
    pub inputs: ReportInputs,
    pub fits: Vec<Fit>,
    pub rejected: Vec<RejectedSeries>,
    pub assignments: Vec<Assignment>,
    /// Test rows skipped at load time; together with `assignments` these cover every input row.
    pub row_errors: Vec<RowError>,
    pub summary: AssignmentSummary,
    pub curves: Vec<CurveSamples>,
}

/// JSON has no NaN/inf: non-finite values are written as `null` and read back as NaN.
mod finite_or_null {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(v: &f64, s: S) -> Result<S::Ok, S::Error> {
        if v.is_finite() {
            s.serialize_f64(*v)
        } else {
            s.serialize_none()
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
        Ok(Option::<f64>::deserialize(d)?.unwrap_or(f64::NAN))
    }
}
