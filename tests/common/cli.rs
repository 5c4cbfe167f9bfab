use assert_cmd::Command;
use std::ffi::OsStr;
use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tempfile::TempDir;

#[derive(Debug)]
pub struct IbRun {
    pub stdout: String,
    pub stderr: String,
    pub status: std::process::ExitStatus,
    pub duration: Duration,
    pub log_path: PathBuf,
}

impl IbRun {
    pub fn code(&self) -> Option<i32> {
        self.status.code()
    }

    pub fn json(&self) -> serde_json::Value {
        let payload = extract_json_payload(&self.stdout);
        serde_json::from_str(&payload)
            .unwrap_or_else(|e| panic!("stdout is not JSON ({e}):\n{}", self.stdout))
    }
}

/// Isolated working directory with a `runs/` data tree and `logs/`.
pub struct IbWorkspace {
    pub temp_dir: TempDir,
    pub root: PathBuf,
    pub data_dir: PathBuf,
    pub log_dir: PathBuf,
}

impl IbWorkspace {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("temp dir");
        let root = temp_dir.path().to_path_buf();
        let data_dir = root.join("runs");
        let log_dir = root.join("logs");
        fs::create_dir_all(&data_dir).expect("data dir");
        fs::create_dir_all(&log_dir).expect("log dir");
        Self {
            temp_dir,
            root,
            data_dir,
            log_dir,
        }
    }

    pub fn cache_path(&self) -> PathBuf {
        self.root.join("ibplot-cache.json")
    }
}

pub fn run_ib<I, S>(workspace: &IbWorkspace, args: I, label: &str) -> IbRun
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    run_ib_with_env(
        workspace,
        args,
        std::iter::empty::<(String, String)>(),
        label,
    )
}

pub fn run_ib_with_env<I, S, E, K, V>(
    workspace: &IbWorkspace,
    args: I,
    env_vars: E,
    label: &str,
) -> IbRun
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
    E: IntoIterator<Item = (K, V)>,
    K: AsRef<OsStr>,
    V: AsRef<OsStr>,
{
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("ibplot"));
    cmd.current_dir(&workspace.root);
    cmd.args(args);
    cmd.envs(env_vars);
    cmd.env("NO_COLOR", "1");
    cmd.env("RUST_LOG", "infbench_plot=debug");
    cmd.env("COLUMNS", "200");

    let start = Instant::now();
    let output = cmd.output().expect("run ibplot");
    let duration = start.elapsed();

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();

    let log_path = workspace.log_dir.join(format!("{label}.log"));
    let log_body = format!(
        "label: {label}\nduration: {:?}\nstatus: {}\nargs: {:?}\n\nstdout:\n{}\n\nstderr:\n{}\n",
        duration,
        output.status,
        cmd.get_args().collect::<Vec<_>>(),
        stdout,
        stderr
    );
    fs::write(&log_path, log_body).expect("write log");

    IbRun {
        stdout,
        stderr,
        status: output.status,
        duration,
        log_path,
    }
}

pub fn extract_json_payload(stdout: &str) -> String {
    let lines: Vec<&str> = stdout.lines().collect();
    for (idx, line) in lines.iter().enumerate() {
        let trimmed = line.trim_start();
        if trimmed.starts_with('[') || trimmed.starts_with('{') {
            return lines[idx..].join("\n").trim().to_string();
        }
    }
    stdout.trim().to_string()
}
