mod common;

use common::cli::{IbWorkspace, run_ib};
use common::fixtures::seed_basic_tree;
use std::fs;

#[test]
fn e2e_unknown_factor_exits_with_layout_code() {
    let _log = common::test_log("e2e_unknown_factor_exits_with_layout_code");
    let workspace = IbWorkspace::new();
    seed_basic_tree(&workspace.data_dir);

    let run = run_ib(
        &workspace,
        ["summary", "--data", "runs", "--rows", "probz", "--prob", "goris2015"],
        "unknown_factor",
    );
    assert_eq!(run.code(), Some(2));
    assert!(run.stderr.contains("UNKNOWN_FACTOR"));
    assert!(run.stderr.contains("probz"));
}

#[test]
fn e2e_duplicate_axis_is_invalid_layout() {
    let _log = common::test_log("e2e_duplicate_axis_is_invalid_layout");
    let workspace = IbWorkspace::new();
    seed_basic_tree(&workspace.data_dir);

    let run = run_ib(
        &workspace,
        ["summary", "--data", "runs", "--rows", "alg", "--cols", "algorithm"],
        "duplicate_axis",
    );
    assert_eq!(run.code(), Some(2));
    assert!(run.stderr.contains("INVALID_LAYOUT"));
}

#[test]
fn e2e_missing_data_dir() {
    let _log = common::test_log("e2e_missing_data_dir");
    let workspace = IbWorkspace::new();

    let run = run_ib(
        &workspace,
        ["summary", "--json", "--data", "nowhere", "--prob", "p", "--subprob", "s", "--alg", "a"],
        "missing_data",
    );
    assert_eq!(run.code(), Some(3));
    assert!(run.stderr.contains("DATA_DIR_NOT_FOUND"));
    assert!(run.stdout.trim().is_empty());
}

#[test]
fn e2e_malformed_run_file_is_skipped() {
    let _log = common::test_log("e2e_malformed_run_file_is_skipped");
    let workspace = IbWorkspace::new();
    seed_basic_tree(&workspace.data_dir);
    let dir = workspace.data_dir.join("goris2015").join("S1").join("vbmc");
    fs::write(dir.join("broken.json"), "{ \"runs\": [ {").expect("write broken");
    fs::write(dir.join(".hidden.json"), "garbage").expect("write hidden");
    fs::write(dir.join("notes.txt"), "ignored").expect("write notes");

    let run = run_ib(
        &workspace,
        [
            "summary", "--json", "--data", "runs", "--prob", "goris2015", "--subprob", "S1",
            "--alg", "vbmc",
        ],
        "malformed_run",
    );
    assert!(run.status.success(), "summary failed: {}", run.stderr);
    assert!(run.stderr.contains("Skipping run file"));
    let json = run.json();
    assert_eq!(json["table"][0]["runs"], 2);
}

#[test]
fn e2e_unknown_report_format() {
    let _log = common::test_log("e2e_unknown_report_format");
    let workspace = IbWorkspace::new();

    let run = run_ib(&workspace, ["summary", "--report", "xml"], "bad_report");
    assert_eq!(run.code(), Some(7));
    assert!(run.stderr.contains("CONFIG_ERROR"));
}

#[test]
fn e2e_conflicting_cache_flags_rejected_by_parser() {
    let _log = common::test_log("e2e_conflicting_cache_flags_rejected_by_parser");
    let workspace = IbWorkspace::new();

    let run = run_ib(&workspace, ["summary", "--no-cache", "--save-cache"], "conflict");
    assert!(!run.status.success());
    assert!(run.stderr.contains("cannot be used with"));
}
