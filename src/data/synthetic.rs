//! Seeded synthetic datasets in the wide CSV layout the loader reads.
//!
//! The candidate catalogue is deterministic (no randomness); the seed only
//! drives which candidates become training series and how the noise falls.

use std::fs::{File, create_dir_all};
use std::path::{Path, PathBuf};

use rand::prelude::*;
use rand::rngs::StdRng;
use rand::seq::index;
use rand_distr::Normal;
use tracing::info;

use crate::domain::{CandidateSet, Series, SeriesSet, TestPoint, TrainingSet};
use crate::error::AppError;

/// Samples on the shared grid: `x = -20.0, -19.9, ..., 19.9`.
pub const GRID_LEN: usize = 400;

/// Number of distinct parametric shape families in the catalogue.
const SHAPE_FAMILIES: usize = 8;

/// Outlier jumps are this many noise units (or absolute units, whichever is larger).
const OUTLIER_SCALE: f64 = 8.0;

#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticOptions {
    pub seed: u64,
    pub candidates: usize,
    pub training: usize,
    pub test_points: usize,
    /// Std dev of the Gaussian noise on training samples and test points.
    pub noise: f64,
    pub outlier_prob: f64,
    pub off_grid_prob: f64,
}

impl Default for SyntheticOptions {
    fn default() -> Self {
        Self {
            seed: 42,
            candidates: 50,
            training: 4,
            test_points: 100,
            noise: 0.3,
            outlier_prob: 0.1,
            off_grid_prob: 0.05,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SyntheticData {
    pub training: TrainingSet,
    pub candidates: CandidateSet,
    pub test: Vec<TestPoint>,
    /// Candidate id each training series was derived from (training order).
    pub sources: Vec<usize>,
}

/// The shared x grid.
pub fn grid() -> Vec<f64> {
    (0..GRID_LEN).map(|i| (i as f64 - 200.0) / 10.0).collect()
}

/// Deterministic value of catalogue entry `k` (0-based) at `x`.
pub fn catalogue_value(k: usize, x: f64) -> f64 {
    let a = 1.0 + (k / SHAPE_FAMILIES) as f64 * 0.5;
    match k % SHAPE_FAMILIES {
        0 => a * x + (k / SHAPE_FAMILIES) as f64,
        1 => 0.05 * a * x * x,
        2 => a * (x + 0.3 * k as f64).sin(),
        3 => a * (x / a).cos(),
        4 => 0.002 * a * x * x * x,
        5 => 5.0 * a * (-x * x / (2.0 * a * a * 4.0)).exp(),
        6 => 3.0 * a * (x / (2.0 * a)).tanh(),
        _ => a * x.abs().sqrt(),
    }
}

pub fn generate(options: &SyntheticOptions) -> Result<SyntheticData, AppError> {
    validate(options)?;

    let x = grid();
    let mut rng = StdRng::seed_from_u64(options.seed);
    let normal = Normal::new(0.0, 1.0).map_err(|e| AppError::new(4, format!("Noise distribution error: {e}")))?;

    let mut candidates = Vec::with_capacity(options.candidates);
    for k in 0..options.candidates {
        let y = x.iter().map(|&v| catalogue_value(k, v)).collect();
        candidates.push(new_series(format!("y{}", k + 1), x.clone(), y)?);
    }

    let picks: Vec<usize> = index::sample(&mut rng, options.candidates, options.training).into_vec();

    let mut training = Vec::with_capacity(picks.len());
    for (n, &k) in picks.iter().enumerate() {
        let y = x
            .iter()
            .map(|&v| catalogue_value(k, v) + options.noise * normal.sample(&mut rng))
            .collect();
        training.push(new_series(format!("y{}", n + 1), x.clone(), y)?);
    }

    let mut test = Vec::with_capacity(options.test_points);
    for _ in 0..options.test_points {
        let k = picks[rng.gen_range(0..picks.len())];
        let i = rng.gen_range(0..GRID_LEN);
        let off_grid = rng.r#gen::<f64>() < options.off_grid_prob;
        // Midpoints between samples never coincide with a grid value.
        let px = if off_grid {
            (2.0 * (i as f64 - 200.0) + 1.0) / 20.0
        } else {
            x[i]
        };

        let mut py = catalogue_value(k, x[i]) + options.noise * normal.sample(&mut rng);
        if rng.r#gen::<f64>() < options.outlier_prob {
            let sign = if rng.r#gen::<bool>() { 1.0 } else { -1.0 };
            py += sign * OUTLIER_SCALE * options.noise.max(1.0);
        }
        test.push(TestPoint::new(px, py));
    }

    Ok(SyntheticData {
        training: SeriesSet::from_series(training),
        candidates: SeriesSet::from_series(candidates),
        test,
        sources: picks.into_iter().map(|k| k + 1).collect(),
    })
}

fn validate(options: &SyntheticOptions) -> Result<(), AppError> {
    if options.candidates == 0 {
        return Err(AppError::new(2, "Candidate count must be > 0."));
    }
    if options.training == 0 || options.training > options.candidates {
        return Err(AppError::new(
            2,
            format!(
                "Training count must be in 1..={} (one distinct candidate per series).",
                options.candidates
            ),
        ));
    }
    if !(options.noise.is_finite() && options.noise >= 0.0) {
        return Err(AppError::new(2, "Noise must be a finite value >= 0."));
    }
    for (name, p) in [("outlier", options.outlier_prob), ("off-grid", options.off_grid_prob)] {
        if !(0.0..=1.0).contains(&p) {
            return Err(AppError::new(2, format!("Invalid {name} probability: {p} (expected 0..=1).")));
        }
    }
    Ok(())
}

fn new_series(label: String, x: Vec<f64>, y: Vec<f64>) -> Result<Series, AppError> {
    Series::new(label, x, y).map_err(|e| AppError::new(4, format!("Synthetic series is malformed: {e}")))
}

/// Write `train.csv`, `ideal.csv` and `test.csv` into `dir`.
pub fn write_synthetic(data: &SyntheticData, dir: &Path) -> Result<Vec<PathBuf>, AppError> {
    create_dir_all(dir)
        .map_err(|e| AppError::new(2, format!("Failed to create output dir '{}': {e}", dir.display())))?;

    let train = dir.join("train.csv");
    let ideal = dir.join("ideal.csv");
    let test = dir.join("test.csv");

    write_wide_csv(&train, &data.training)?;
    write_wide_csv(&ideal, &data.candidates)?;
    write_test_csv(&test, &data.test)?;

    info!(dir = %dir.display(), training = data.training.len(), candidates = data.candidates.len(), test = data.test.len(), "wrote synthetic dataset");
    Ok(vec![train, ideal, test])
}

fn write_wide_csv(path: &Path, set: &SeriesSet) -> Result<(), AppError> {
    let mut writer = csv_writer(path)?;
    let write_err = |e: csv::Error| AppError::new(2, format!("Failed to write '{}': {e}", path.display()));

    let series: Vec<&Series> = set.iter().map(|(_, s)| s).collect();
    let Some(first) = series.first() else {
        return Err(AppError::new(4, "Cannot write an empty series table."));
    };

    let mut header = vec!["x".to_string()];
    header.extend(series.iter().map(|s| s.label.clone()));
    writer.write_record(&header).map_err(write_err)?;

    for (row, x) in first.x().iter().enumerate() {
        let mut record = Vec::with_capacity(series.len() + 1);
        record.push(x.to_string());
        record.extend(series.iter().map(|s| s.y()[row].to_string()));
        writer.write_record(&record).map_err(write_err)?;
    }
    writer
        .flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush '{}': {e}", path.display())))
}

fn write_test_csv(path: &Path, points: &[TestPoint]) -> Result<(), AppError> {
    let mut writer = csv_writer(path)?;
    let write_err = |e: csv::Error| AppError::new(2, format!("Failed to write '{}': {e}", path.display()));

    writer.write_record(["x", "y"]).map_err(write_err)?;
    for p in points {
        writer
            .write_record([p.x.to_string(), p.y.to_string()])
            .map_err(write_err)?;
    }
    writer
        .flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush '{}': {e}", path.display())))
}

fn csv_writer(path: &Path) -> Result<csv::Writer<File>, AppError> {
    csv::Writer::from_path(path).map_err(|e| AppError::new(2, format!("Failed to create '{}': {e}", path.display())))
}
