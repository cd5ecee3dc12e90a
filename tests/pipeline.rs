use std::path::PathBuf;

use approx::assert_relative_eq;
use chrono::{TimeZone, Utc};
use ideal_fit::app::pipeline::{run_match, run_match_with};
use ideal_fit::data::{SyntheticOptions, generate, write_synthetic};
use ideal_fit::domain::{Execution, MatchConfig, Outcome};
use ideal_fit::io::export::{CsvSink, ResultSink, write_assignments_csv};
use ideal_fit::io::ingest::{Datasets, read_series_table, read_test_points};
use ideal_fit::io::report_file::{JsonSink, parse_report_json, read_report_json};
use ideal_fit::report::{build_report_at, format_run_summary};

const TRAIN: &str = "x,y1,y2\n0,0.1,2.0\n1,1.1,2.0\n2,1.9,2.1\n3,3.0,1.9\n";
const IDEAL: &str = "x,y1,y2,y3\n0,0,2,-1\n1,1,2,-1\n2,2,2,-1\n3,3,2,-1\n";
const TEST: &str = "x,y\n1,1.05\n2,2.05\n0.5,1\n3,10\n2,2.5\n";

fn datasets() -> Datasets {
    Datasets {
        training: read_series_table(TRAIN.as_bytes(), "train").unwrap(),
        candidates: read_series_table(IDEAL.as_bytes(), "ideal").unwrap(),
        test: read_test_points(TEST.as_bytes(), "test").unwrap(),
    }
}

fn temp_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("ideal-fit-{name}-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn end_to_end_on_in_memory_tables() {
    let run = run_match_with(datasets(), Execution::Parallel).unwrap();

    let fits = &run.selection.fits;
    assert_eq!(fits.len(), 2);
    assert_eq!((fits[0].training_id, fits[0].candidate_id), (1, 1));
    assert_eq!((fits[1].training_id, fits[1].candidate_id), (2, 2));
    assert_relative_eq!(fits[0].sum_squared_error, 0.03, epsilon = 1e-12);
    assert_relative_eq!(fits[0].max_abs_deviation, 0.1, epsilon = 1e-12);
    assert_relative_eq!(fits[0].tolerance, 0.1 * std::f64::consts::SQRT_2, epsilon = 1e-12);

    let outcomes: Vec<Outcome> = run.assignments.iter().map(|a| a.outcome).collect();
    assert_eq!(
        outcomes,
        vec![
            Outcome::Matched,
            Outcome::Matched,
            Outcome::UnmappableDomain,
            Outcome::NoQualifyingFit,
            Outcome::NoQualifyingFit,
        ]
    );
    assert_eq!(run.assignments[0].matched_candidate_id, Some(1));
    // y=2.05 at x=2: 0.05 from candidate 1, 0.05 from candidate 2 (tolerance 0.1414 each).
    assert_eq!(run.assignments[1].matched_training_id, Some(1));

    assert_eq!(run.summary.total, 5);
    assert_eq!(run.summary.matched, 2);
    assert_eq!(run.summary.unmappable, 1);
    assert_eq!(run.summary.no_fit, 2);

    let text = format_run_summary(&run.datasets, &run.selection, &run.summary);
    assert!(text.contains("total=5 matched=2 unmappable=1 no_fit=2"));
}

#[test]
fn sequential_and_parallel_runs_agree() {
    let seq = run_match_with(datasets(), Execution::Sequential).unwrap();
    let par = run_match_with(datasets(), Execution::Parallel).unwrap();
    assert_eq!(seq.selection, par.selection);
    assert_eq!(seq.assignments, par.assignments);
    assert_eq!(seq.summary, par.summary);
}

#[test]
fn mismatched_domain_aborts_with_data_exit_code() {
    let mut d = datasets();
    d.training = read_series_table("x,y1\n0,0\n1,1\n2,2\n4,3\n".as_bytes(), "train").unwrap();
    let err = run_match_with(d, Execution::Sequential).unwrap_err();
    assert_eq!(err.exit_code(), 3);
}

#[test]
fn report_json_round_trips_and_csv_has_one_row_per_point() {
    let run = run_match_with(datasets(), Execution::Sequential).unwrap();
    let report = build_report_at(&run, Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap());
    assert_eq!(report.curves.len(), 2);
    assert_eq!(report.inputs.candidates, "ideal");

    let json = serde_json::to_string(&report).unwrap();
    let back = parse_report_json(json.as_bytes()).unwrap();
    assert_eq!(back, report);

    let mut buf = Vec::new();
    write_assignments_csv(&mut buf, &report.assignments).unwrap();
    let text = String::from_utf8(buf).unwrap();
    assert_eq!(text.lines().count(), 1 + run.assignments.len());
    assert!(text.lines().nth(3).unwrap().ends_with(",,,unmappable_domain"));
}

#[test]
fn every_test_row_is_an_assignment_or_a_row_error() {
    let mut d = datasets();
    d.test = read_test_points("x,y\n1,1\n2,nan\n,3\n2,2\n".as_bytes(), "test").unwrap();
    let rows_read = d.test.rows_read;
    let run = run_match_with(d, Execution::Sequential).unwrap();
    let report = build_report_at(&run, Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap());

    assert_eq!(rows_read, 4);
    assert_eq!(report.assignments.len() + report.row_errors.len(), rows_read);
    assert_eq!(report.row_errors.len(), 1);
    assert_eq!(report.row_errors[0].line, 4);

    let nan_row = &report.assignments[1];
    assert_eq!(nan_row.x, 2.0);
    assert!(nan_row.y.is_nan());
    assert_eq!(nan_row.outcome, Outcome::NoQualifyingFit);
    assert_eq!(report.assignments[2].outcome, Outcome::Matched);

    let json = serde_json::to_string(&report).unwrap();
    assert!(json.contains("\"y\":null"));
    let back = parse_report_json(json.as_bytes()).unwrap();
    assert!(back.assignments[1].y.is_nan());
    assert_eq!(back.row_errors, report.row_errors);
}

#[test]
fn file_sinks_write_and_reload() {
    let dir = temp_dir("sinks");
    for (name, body) in [("train.csv", TRAIN), ("ideal.csv", IDEAL), ("test.csv", TEST)] {
        std::fs::write(dir.join(name), body).unwrap();
    }
    let config = MatchConfig {
        train_path: dir.join("train.csv"),
        ideal_path: dir.join("ideal.csv"),
        test_path: dir.join("test.csv"),
        execution: Execution::Parallel,
        top_n: 10,
        plot: false,
        plot_width: 40,
        plot_height: 10,
        export_csv: None,
        export_json: None,
        debug_dir: None,
    };
    let run = run_match(&config).unwrap();
    let report = ideal_fit::report::build_report(&run);

    let mut csv = CsvSink::new(dir.join("out.csv"));
    csv.write(&report).unwrap();
    let mut json = JsonSink::new(dir.join("out.json"));
    json.write(&report).unwrap();

    let written = std::fs::read_to_string(dir.join("out.csv")).unwrap();
    assert!(written.starts_with("x,y,delta_y,ideal_func_no,training_no,outcome\n"));
    let reloaded = read_report_json(&dir.join("out.json")).unwrap();
    assert_eq!(reloaded.assignments, report.assignments);

    let plot = ideal_fit::plot::render_assignment_plot(&reloaded, 40, 10);
    assert_eq!(plot.lines().count(), 11);

    let bundle = ideal_fit::debug::write_debug_bundle(&run, &dir.join("debug")).unwrap();
    let md = std::fs::read_to_string(bundle).unwrap();
    assert!(md.starts_with("# ideal debug bundle"));
    assert!(md.contains("## Training y2 (#2)"));

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn synthetic_dataset_recovers_its_sources() {
    let dir = temp_dir("synthetic");
    let options = SyntheticOptions {
        seed: 7,
        noise: 0.05,
        ..SyntheticOptions::default()
    };
    let data = generate(&options).unwrap();
    write_synthetic(&data, &dir).unwrap();

    let config = MatchConfig {
        train_path: dir.join("train.csv"),
        ideal_path: dir.join("ideal.csv"),
        test_path: dir.join("test.csv"),
        execution: Execution::Parallel,
        top_n: 10,
        plot: false,
        plot_width: 40,
        plot_height: 10,
        export_csv: None,
        export_json: None,
        debug_dir: None,
    };
    let run = run_match(&config).unwrap();
    assert_eq!(run.datasets.candidates.stats.n_samples, 400);
    assert_eq!(run.datasets.test.points, data.test);

    let chosen: Vec<usize> = run.selection.fits.iter().map(|f| f.candidate_id).collect();
    assert_eq!(chosen, data.sources);

    let s = &run.summary;
    assert_eq!(s.total, options.test_points);
    assert_eq!(s.matched + s.unmappable + s.no_fit, s.total);
    assert!(s.matched > 0);

    std::fs::remove_dir_all(&dir).unwrap();
}
