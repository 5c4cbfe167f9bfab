mod common;

use common::cli::{IbWorkspace, run_ib};
use common::fixtures::seed_basic_tree;
use serde_json::Value;

fn summary_args(workspace: &IbWorkspace, extra: &[&str]) -> Vec<String> {
    let mut args: Vec<String> = [
        "summary",
        "--data",
        "runs",
        "--prob",
        "goris2015,akrami2018",
        "--subprob",
        "S1",
        "--alg",
        "vbmc,bmc",
        "--samples",
        "0",
    ]
    .iter()
    .map(ToString::to_string)
    .collect();
    args.push("--cache".to_string());
    args.push(workspace.cache_path().to_string_lossy().to_string());
    args.extend(extra.iter().map(ToString::to_string));
    args
}

fn row<'a>(table: &'a [Value], problem: &str, algorithm: &str) -> &'a Value {
    table
        .iter()
        .find(|r| r["problem"] == problem && r["algorithm"] == algorithm)
        .unwrap_or_else(|| panic!("no row for {problem}/{algorithm}"))
}

fn approx(value: &Value, expected: f64) {
    let actual = value.as_f64().expect("number");
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}

#[test]
fn e2e_summary_json_reports_medians_and_bands() {
    let _log = common::test_log("e2e_summary_json_reports_medians_and_bands");
    let workspace = IbWorkspace::new();
    seed_basic_tree(&workspace.data_dir);

    let run = run_ib(&workspace, summary_args(&workspace, &["--json"]), "summary_json");
    assert!(run.status.success(), "summary failed: {}", run.stderr);
    let json = run.json();

    assert_eq!(json["layer_factor"], "alg");
    assert_eq!(json["aggregation"]["jobs"], 4);
    assert_eq!(json["aggregation"]["collected"], 4);
    assert_eq!(json["aggregation"]["empty"], 1);
    assert_eq!(json["aggregation"]["cache_hits"], 0);

    let table = json["table"].as_array().expect("table array");
    assert_eq!(table.len(), 3);

    let vbmc = row(table, "goris2015", "vbmc");
    assert_eq!(vbmc["subproblem"], "S1");
    assert_eq!(vbmc["runs"], 2);
    approx(&vbmc["final_median"], 1.0);
    approx(&vbmc["final_lower"], 0.5);
    approx(&vbmc["final_upper"], 1.5);
    approx(&vbmc["solved_fraction"], 0.5);
    assert!(vbmc["median_ci"].is_null());

    let bmc = row(table, "goris2015", "bmc");
    approx(&bmc["final_tick"], 20.0);
    approx(&bmc["final_median"], 2.5);
    approx(&bmc["solved_fraction"], 0.0);

    let single = row(table, "akrami2018", "vbmc");
    approx(&single["final_median"], 0.25);
    approx(&single["final_lower"], 0.25);
}

#[test]
fn e2e_summary_best_of_keeps_lowest_error() {
    let _log = common::test_log("e2e_summary_best_of_keeps_lowest_error");
    let workspace = IbWorkspace::new();
    seed_basic_tree(&workspace.data_dir);

    let run = run_ib(
        &workspace,
        summary_args(&workspace, &["--json", "--best-of", "2"]),
        "summary_best_of",
    );
    assert!(run.status.success(), "summary failed: {}", run.stderr);
    let json = run.json();
    let table = json["table"].as_array().expect("table array");

    let vbmc = row(table, "goris2015", "vbmc");
    assert_eq!(vbmc["runs"], 1);
    approx(&vbmc["final_median"], 0.5);
    approx(&vbmc["solved_fraction"], 1.0);
}

#[test]
fn e2e_summary_text_and_csv() {
    let _log = common::test_log("e2e_summary_text_and_csv");
    let workspace = IbWorkspace::new();
    seed_basic_tree(&workspace.data_dir);

    let text = run_ib(&workspace, summary_args(&workspace, &[]), "summary_text");
    assert!(text.status.success(), "summary failed: {}", text.stderr);
    assert!(text.stdout.contains("PROBLEM"));
    assert!(text.stdout.contains("goris2015"));
    assert!(text.stdout.contains("akrami2018"));

    let csv = run_ib(
        &workspace,
        summary_args(&workspace, &["--report", "csv"]),
        "summary_csv",
    );
    assert!(csv.status.success(), "summary failed: {}", csv.stderr);
    let mut lines = csv.stdout.lines();
    assert!(lines.next().expect("header").starts_with("problem,subproblem,algorithm,runs"));
    assert_eq!(lines.count(), 3);
}

#[test]
fn e2e_summary_holes_are_skipped() {
    let _log = common::test_log("e2e_summary_holes_are_skipped");
    let workspace = IbWorkspace::new();
    seed_basic_tree(&workspace.data_dir);

    let mut args = summary_args(&workspace, &["--json"]);
    let alg_pos = args.iter().position(|a| a == "--alg").expect("--alg") + 1;
    args[alg_pos] = "vbmc,,bmc".to_string();

    let run = run_ib(&workspace, args, "summary_holes");
    assert!(run.status.success(), "summary failed: {}", run.stderr);
    let json = run.json();
    assert_eq!(json["aggregation"]["jobs"], 4);
    assert_eq!(json["table"].as_array().expect("table").len(), 3);
}

#[test]
fn e2e_summary_config_file_sets_factors() {
    let _log = common::test_log("e2e_summary_config_file_sets_factors");
    let workspace = IbWorkspace::new();
    seed_basic_tree(&workspace.data_dir);
    std::fs::write(
        workspace.root.join("ibplot.yaml"),
        "data_dir: runs\nprob: [goris2015]\nsubprob: [S1]\nalg: [vbmc, bmc]\nsamples: 0\n",
    )
    .expect("write config");

    let run = run_ib(&workspace, ["summary", "--json", "--no-cache"], "summary_config");
    assert!(run.status.success(), "summary failed: {}", run.stderr);
    let json = run.json();
    assert_eq!(json["aggregation"]["jobs"], 2);
    assert_eq!(json["table"].as_array().expect("table").len(), 2);
}
