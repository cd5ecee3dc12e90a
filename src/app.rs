//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and parses CLI arguments
//! - initializes logging
//! - runs fit selection + test point assignment
//! - prints reports/plots
//! - writes optional exports

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::cli::{Command, DataArgs, FitsArgs, GenerateArgs, MatchArgs, PlotArgs};
use crate::data::{SyntheticOptions, generate, write_synthetic};
use crate::domain::{Execution, MatchConfig};
use crate::error::AppError;
use crate::io::export::{CsvSink, ResultSink};
use crate::io::report_file::{JsonSink, read_report_json};

pub mod pipeline;

/// Entry point for the `ideal` binary.
pub fn run() -> Result<(), AppError> {
    // A missing `.env` is fine; clap falls back to its defaults.
    let _ = dotenvy::dotenv();
    let cli = crate::cli::Cli::parse();

    // The TUI owns the screen, so only warnings and errors get through.
    let default_level = match (&cli.command, cli.verbose) {
        (Command::Tui(_), _) => "warn",
        (_, true) => "debug",
        (_, false) => "info",
    };
    init_tracing(default_level);

    match cli.command {
        Command::Match(args) => handle_match(args),
        Command::Fits(args) => handle_fits(args),
        Command::Plot(args) => handle_plot(args),
        Command::Tui(args) => handle_tui(args),
        Command::Generate(args) => handle_generate(args),
    }
}

fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    // A second init (e.g. from tests) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn handle_match(args: MatchArgs) -> Result<(), AppError> {
    let config = match_config_from_args(&args);
    let run = pipeline::run_match(&config)?;

    println!(
        "{}",
        crate::report::format_run_summary(&run.datasets, &run.selection, &run.summary)
    );
    println!("{}", crate::report::format_assignments(&run.assignments, config.top_n));

    if config.plot {
        for fit in &run.selection.fits {
            let training = run.datasets.training.set.get(fit.training_id);
            let candidate = run.datasets.candidates.set.get(fit.candidate_id);
            if let (Some(training), Some(candidate)) = (training, candidate) {
                println!("{} vs {}", fit.training_label, fit.candidate_label);
                println!(
                    "{}",
                    crate::plot::render_fit_plot(training, candidate, config.plot_width, config.plot_height)
                );
            }
        }
    }

    // Optional exports.
    let mut sinks: Vec<Box<dyn ResultSink>> = Vec::new();
    if let Some(path) = &config.export_csv {
        sinks.push(Box::new(CsvSink::new(path)));
    }
    if let Some(path) = &config.export_json {
        sinks.push(Box::new(JsonSink::new(path)));
    }
    if !sinks.is_empty() {
        let report = crate::report::build_report(&run);
        for sink in &mut sinks {
            sink.write(&report)?;
        }
    }

    if let Some(dir) = &config.debug_dir {
        let path = crate::debug::write_debug_bundle(&run, dir)?;
        println!("Wrote debug bundle: {}", path.display());
    }

    Ok(())
}

fn handle_fits(args: FitsArgs) -> Result<(), AppError> {
    let config = data_config(&args.data);
    let datasets = crate::io::ingest::load_datasets(&config)?;
    let selection =
        crate::fit::select_best_fits(&datasets.training.set, &datasets.candidates.set, config.execution)?;

    // Rejections are already logged by the selection step.
    println!("{}", crate::report::format_fit_lines(&selection));

    let rankings = crate::report::rank_candidates(&datasets.training.set, &datasets.candidates.set);
    print!(
        "{}",
        crate::report::format_scores(&rankings, &datasets.candidates.set, args.top)
    );
    Ok(())
}

fn handle_tui(args: DataArgs) -> Result<(), AppError> {
    crate::tui::run(&data_config(&args))
}

fn handle_plot(args: PlotArgs) -> Result<(), AppError> {
    let report = read_report_json(&args.report)?;
    let plot = crate::plot::render_assignment_plot(&report, args.width, args.height);
    println!("{plot}");
    Ok(())
}

fn handle_generate(args: GenerateArgs) -> Result<(), AppError> {
    let options = SyntheticOptions {
        seed: args.seed,
        candidates: args.candidates,
        training: args.training,
        test_points: args.test_points,
        noise: args.noise,
        outlier_prob: args.outlier_prob,
        off_grid_prob: args.off_grid_prob,
    };
    let data = generate(&options)?;
    let paths = write_synthetic(&data, &args.out_dir)?;
    for path in &paths {
        println!("Wrote {}", path.display());
    }
    info!(sources = ?data.sources, "training series derived from candidates");
    Ok(())
}

pub fn match_config_from_args(args: &MatchArgs) -> MatchConfig {
    MatchConfig {
        top_n: args.top,
        plot: args.plot && !args.no_plot,
        plot_width: args.width,
        plot_height: args.height,
        export_csv: args.export.clone(),
        export_json: args.export_json.clone(),
        debug_dir: args.debug.then(|| args.debug_dir.clone()),
        ..data_config(&args.data)
    }
}

fn data_config(args: &DataArgs) -> MatchConfig {
    MatchConfig {
        train_path: args.train.clone(),
        ideal_path: args.ideal.clone(),
        test_path: args.test.clone(),
        execution: if args.sequential {
            Execution::Sequential
        } else {
            Execution::Parallel
        },
        top_n: 20,
        plot: false,
        plot_width: 100,
        plot_height: 25,
        export_csv: None,
        export_json: None,
        debug_dir: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn match_flags_become_config() {
        let cli = crate::cli::Cli::parse_from([
            "ideal",
            "match",
            "--train",
            "a.csv",
            "--ideal",
            "b.csv",
            "--test",
            "c.csv",
            "--sequential",
            "--no-plot",
            "--debug",
            "--debug-dir",
            "dbg",
        ]);
        let Command::Match(args) = cli.command else {
            panic!("expected match");
        };
        let config = match_config_from_args(&args);
        assert_eq!(config.train_path, PathBuf::from("a.csv"));
        assert_eq!(config.ideal_path, PathBuf::from("b.csv"));
        assert_eq!(config.test_path, PathBuf::from("c.csv"));
        assert_eq!(config.execution, Execution::Sequential);
        assert!(!config.plot);
        assert_eq!(config.debug_dir, Some(PathBuf::from("dbg")));
        assert_eq!(config.export_csv, None);
    }

    #[test]
    fn debug_dir_only_when_requested() {
        let cli = crate::cli::Cli::parse_from(["ideal", "match"]);
        let Command::Match(args) = cli.command else {
            panic!("expected match");
        };
        let config = match_config_from_args(&args);
        assert_eq!(config.debug_dir, None);
        assert!(config.plot);
        assert_eq!(config.execution, Execution::Parallel);
    }
}
