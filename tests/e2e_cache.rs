mod common;

use common::cli::{IbWorkspace, run_ib};
use common::fixtures::seed_basic_tree;
use std::fs;

fn summary(workspace: &IbWorkspace, extra: &[&str], label: &str) -> serde_json::Value {
    let cache = workspace.cache_path().to_string_lossy().to_string();
    let mut args = vec![
        "summary",
        "--json",
        "--data",
        "runs",
        "--prob",
        "goris2015,akrami2018",
        "--subprob",
        "S1",
        "--alg",
        "vbmc,bmc",
        "--cache",
        cache.as_str(),
    ];
    args.extend_from_slice(extra);
    let run = run_ib(workspace, args, label);
    assert!(run.status.success(), "{label} failed: {}", run.stderr);
    run.json()
}

#[test]
fn e2e_cache_reuse_and_recompute() {
    let _log = common::test_log("e2e_cache_reuse_and_recompute");
    let workspace = IbWorkspace::new();
    seed_basic_tree(&workspace.data_dir);

    let first = summary(&workspace, &["--save-cache"], "first");
    assert_eq!(first["aggregation"]["collected"], 4);
    assert!(workspace.cache_path().exists());

    // Cached histories survive the run files going away.
    fs::remove_dir_all(&workspace.data_dir).expect("remove runs");
    fs::create_dir_all(&workspace.data_dir).expect("recreate runs");

    let second = summary(&workspace, &[], "second");
    assert_eq!(second["aggregation"]["cache_hits"], 3);
    assert_eq!(second["aggregation"]["collected"], 1);
    assert_eq!(second["table"], first["table"]);

    let third = summary(&workspace, &["--best-of", "2"], "third");
    assert_eq!(third["aggregation"]["recomputed"], 3);
    assert_eq!(third["aggregation"]["cache_hits"], 0);
}

#[test]
fn e2e_cache_disabled_collects_everything() {
    let _log = common::test_log("e2e_cache_disabled_collects_everything");
    let workspace = IbWorkspace::new();
    seed_basic_tree(&workspace.data_dir);

    summary(&workspace, &["--save-cache"], "seed_cache");
    let uncached = summary(&workspace, &["--no-cache"], "uncached");
    assert_eq!(uncached["aggregation"]["cache_hits"], 0);
    assert_eq!(uncached["aggregation"]["collected"], 4);
}

#[test]
fn e2e_cache_corrupt_file_is_ignored() {
    let _log = common::test_log("e2e_cache_corrupt_file_is_ignored");
    let workspace = IbWorkspace::new();
    seed_basic_tree(&workspace.data_dir);
    fs::write(workspace.cache_path(), "not json").expect("write cache");

    let json = summary(&workspace, &[], "corrupt");
    assert_eq!(json["aggregation"]["collected"], 4);
}

#[test]
fn e2e_cache_show_and_clear() {
    let _log = common::test_log("e2e_cache_show_and_clear");
    let workspace = IbWorkspace::new();
    seed_basic_tree(&workspace.data_dir);
    summary(&workspace, &["--save-cache"], "seed_cache");

    let cache = workspace.cache_path().to_string_lossy().to_string();
    let show = run_ib(
        &workspace,
        ["cache", "show", "--json", "--cache", cache.as_str()],
        "show",
    );
    assert!(show.status.success(), "show failed: {}", show.stderr);
    let json = show.json();
    let entries = json["entries"].as_array().expect("entries");
    assert_eq!(entries.len(), 3);
    assert!(entries.iter().any(|e| e["key"] == "goris2015_S1_vbmc" && e["runs"] == 2));
    assert!(!json["saved_at"].is_null());

    let text = run_ib(&workspace, ["cache", "show", "--cache", cache.as_str()], "show_text");
    assert!(text.stdout.contains("goris2015_S1_bmc"));

    let clear = run_ib(&workspace, ["cache", "clear", "--cache", cache.as_str()], "clear");
    assert!(clear.status.success(), "clear failed: {}", clear.stderr);
    assert!(clear.stdout.contains("Removed"));
    assert!(!workspace.cache_path().exists());

    let again = run_ib(
        &workspace,
        ["cache", "clear", "--json", "--cache", cache.as_str()],
        "clear_again",
    );
    assert_eq!(again.json()["removed"], false);
}

#[test]
fn e2e_cache_show_rejects_corrupt_file() {
    let _log = common::test_log("e2e_cache_show_rejects_corrupt_file");
    let workspace = IbWorkspace::new();
    fs::write(workspace.cache_path(), "{ nope").expect("write cache");
    let cache = workspace.cache_path().to_string_lossy().to_string();

    let show = run_ib(&workspace, ["cache", "show", "--cache", cache.as_str()], "show_corrupt");
    assert_eq!(show.code(), Some(3));
    assert!(show.stderr.contains("CACHE_CORRUPT"));
}
