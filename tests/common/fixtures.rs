use infbench_plot::collect::run_dir;
use infbench_plot::model::{RunFile, RunHistory, Selection};
use std::fs;
use std::path::Path;

/// Run saved once at `tick`. `lnz_true` is 0, so the absolute error is `|lnz|`.
pub fn single_tick_run(tick: f64, lnz: f64) -> RunHistory {
    run(&[tick], &[lnz])
}

pub fn run(ticks: &[f64], lnz: &[f64]) -> RunHistory {
    RunHistory {
        ticks: ticks.to_vec(),
        lnz: lnz.to_vec(),
        lnz_var: vec![],
        gskl: vec![],
        elapsed_time: vec![],
        func_time: vec![],
        lnz_true: 0.0,
        budget: None,
        speed: 1.0,
    }
}

/// Attach cumulative timing series.
pub fn with_timing(mut run: RunHistory, elapsed: &[f64], func: &[f64]) -> RunHistory {
    run.elapsed_time = elapsed.to_vec();
    run.func_time = func.to_vec();
    run
}

pub fn selection(prob: &str, subprob: &str, alg: &str) -> Selection {
    Selection {
        prob: prob.to_string(),
        subprob: subprob.to_string(),
        alg: alg.to_string(),
        ..Selection::default()
    }
}

/// Write `runs` as `<file>` in the run directory of `selection`.
pub fn write_runs(data_dir: &Path, selection: &Selection, file: &str, runs: Vec<RunHistory>) {
    let dir = run_dir(data_dir, selection);
    fs::create_dir_all(&dir).expect("run dir");
    let json = serde_json::to_string_pretty(&RunFile { runs }).expect("serialize runs");
    fs::write(dir.join(file), json).expect("write run file");
}

/// Two problems x one subproblem x two algorithms; `vbmc` on `goris2015`
/// has final errors 0.5 and 1.5.
pub fn seed_basic_tree(data_dir: &Path) {
    write_runs(
        data_dir,
        &selection("goris2015", "S1", "vbmc"),
        "runs.json",
        vec![single_tick_run(10.0, 0.5), single_tick_run(10.0, -1.5)],
    );
    write_runs(
        data_dir,
        &selection("goris2015", "S1", "bmc"),
        "runs.json",
        vec![
            run(&[10.0, 20.0], &[4.0, 2.0]),
            run(&[10.0, 20.0], &[6.0, 3.0]),
        ],
    );
    write_runs(
        data_dir,
        &selection("akrami2018", "S1", "vbmc"),
        "runs.json",
        vec![single_tick_run(10.0, 0.25)],
    );
}
