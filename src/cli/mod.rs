//! Command-line parsing for the ideal-function matcher.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the fitting code.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "ideal", version, about = "Ideal function selection and test point matching")]
pub struct Cli {
    /// Log at debug level (overridden by RUST_LOG).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Select best fits, assign test points, print the summary, and optionally plot/export.
    Match(MatchArgs),
    /// Print the chosen fits and per-series candidate rankings only.
    Fits(FitsArgs),
    /// Plot a previously exported report JSON.
    Plot(PlotArgs),
    /// Launch the interactive TUI.
    ///
    /// This uses the same underlying pipeline as `ideal match`, but renders
    /// results in a terminal UI using Ratatui.
    Tui(DataArgs),
    /// Write a seeded synthetic dataset (train.csv, ideal.csv, test.csv).
    Generate(GenerateArgs),
}

/// Input tables and execution mode, shared by every command that runs the pipeline.
#[derive(Debug, Args, Clone)]
pub struct DataArgs {
    /// Training table (`x, y1, ..., yN`).
    #[arg(long, env = "IDEAL_TRAIN_CSV", default_value = "train.csv")]
    pub train: PathBuf,

    /// Candidate (ideal function) table (`x, y1, ..., yM`).
    #[arg(long, env = "IDEAL_CANDIDATES_CSV", default_value = "ideal.csv")]
    pub ideal: PathBuf,

    /// Test points (`x, y`).
    #[arg(long, env = "IDEAL_TEST_CSV", default_value = "test.csv")]
    pub test: PathBuf,

    /// Run on the current thread instead of the rayon pool.
    #[arg(long)]
    pub sequential: bool,
}

#[derive(Debug, Args, Clone)]
pub struct MatchArgs {
    #[command(flatten)]
    pub data: DataArgs,

    /// Show the first N assignment rows.
    #[arg(long, default_value_t = 20)]
    pub top: usize,

    /// Render an ASCII plot per fit in the terminal (enabled by default).
    #[arg(long, default_value_t = true)]
    pub plot: bool,

    /// Disable the terminal plot.
    #[arg(long)]
    pub no_plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,

    /// Export the assignment table to CSV.
    #[arg(long)]
    pub export: Option<PathBuf>,

    /// Export the full report (fits, assignments, curves) to JSON.
    #[arg(long = "export-json")]
    pub export_json: Option<PathBuf>,

    /// Write a markdown debug bundle with full candidate scores.
    #[arg(long)]
    pub debug: bool,

    /// Directory for debug bundles.
    #[arg(long, default_value = "debug")]
    pub debug_dir: PathBuf,
}

#[derive(Debug, Args, Clone)]
pub struct FitsArgs {
    #[command(flatten)]
    pub data: DataArgs,

    /// Candidates listed per training series.
    #[arg(long, default_value_t = 5)]
    pub top: usize,
}

/// Options for plotting a saved report.
#[derive(Debug, Args)]
pub struct PlotArgs {
    /// Report JSON file produced by `ideal match --export-json`.
    #[arg(long, value_name = "JSON")]
    pub report: PathBuf,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,
}

#[derive(Debug, Args)]
pub struct GenerateArgs {
    /// Directory receiving train.csv, ideal.csv and test.csv.
    #[arg(long, default_value = ".")]
    pub out_dir: PathBuf,

    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Size of the candidate catalogue.
    #[arg(long, default_value_t = 50)]
    pub candidates: usize,

    /// Training series (each derived from a distinct candidate).
    #[arg(long, default_value_t = 4)]
    pub training: usize,

    #[arg(long, default_value_t = 100)]
    pub test_points: usize,

    /// Std dev of Gaussian noise.
    #[arg(long, default_value_t = 0.3)]
    pub noise: f64,

    /// Probability of a large jump on a test point.
    #[arg(long, default_value_t = 0.1)]
    pub outlier_prob: f64,

    /// Probability of a test point between grid samples.
    #[arg(long, default_value_t = 0.05)]
    pub off_grid_prob: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn match_defaults() {
        let cli = Cli::parse_from(["ideal", "match", "--no-plot", "--export", "out.csv"]);
        let Command::Match(args) = cli.command else {
            panic!("expected match");
        };
        assert!(args.no_plot);
        assert_eq!(args.export, Some(PathBuf::from("out.csv")));
        assert_eq!(args.top, 20);
        assert!(!args.data.sequential);
        assert!(!cli.verbose);
    }

    #[test]
    fn verbose_is_global() {
        let cli = Cli::parse_from(["ideal", "fits", "-v", "--train", "t.csv", "--sequential"]);
        assert!(cli.verbose);
        let Command::Fits(args) = cli.command else {
            panic!("expected fits");
        };
        assert_eq!(args.data.train, PathBuf::from("t.csv"));
        assert!(args.data.sequential);
    }

    #[test]
    fn generate_options() {
        let cli = Cli::parse_from(["ideal", "generate", "--out-dir", "demo", "--seed", "7", "--noise", "0"]);
        let Command::Generate(args) = cli.command else {
            panic!("expected generate");
        };
        assert_eq!(args.out_dir, PathBuf::from("demo"));
        assert_eq!(args.seed, 7);
        assert_eq!(args.noise, 0.0);
        assert_eq!(args.candidates, 50);
    }
}
