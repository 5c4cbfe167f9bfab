//! Raw run collection.
//!
//! Run files live in a directory tree keyed by the label tuple:
//!
//! ```text
//! <data_dir>/<probset>@<prob>/<subprob>[@<noise>]/<alg>@<algset>/*.json
//! ```
//!
//! Each file holds a [`RunFile`]. Unreadable or malformed files are logged
//! and skipped; a missing group directory simply yields no runs.

use crate::error::{PlotError, Result};
use crate::model::{RunFile, RunHistory, Selection};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

static RUN_FILE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^.].*\.json$").expect("valid run-file pattern"));

/// Source of run histories for a label tuple.
pub trait RunCollector {
    /// Collect every run recorded for `selection`.
    ///
    /// # Errors
    ///
    /// Implementations return an error only for failures that affect the
    /// whole collection (not for individual bad files).
    fn collect(&self, selection: &Selection) -> Result<Vec<RunHistory>>;
}

/// Directory of a label tuple under `root`.
#[must_use]
pub fn run_dir(root: &Path, selection: &Selection) -> PathBuf {
    let set_dir = if selection.probset.is_empty() {
        selection.prob.clone()
    } else {
        format!("{}@{}", selection.probset, selection.prob)
    };
    root.join(set_dir)
        .join(selection.subprob_key())
        .join(selection.alg_key())
}

/// Collector over the on-disk run tree.
#[derive(Debug, Clone)]
pub struct DirCollector {
    root: PathBuf,
}

impl DirCollector {
    /// Open a run tree.
    ///
    /// # Errors
    ///
    /// Returns `DataDirNotFound` if `root` is not a directory.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(PlotError::DataDirNotFound { path: root });
        }
        Ok(Self { root })
    }

    fn read_run_file(path: &Path) -> Result<Vec<RunHistory>> {
        let contents = fs::read_to_string(path)?;
        if let Ok(file) = serde_json::from_str::<RunFile>(&contents) {
            return Ok(file.runs);
        }
        serde_json::from_str::<Vec<RunHistory>>(&contents).map_err(|e| PlotError::RunFile {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }
}

impl RunCollector for DirCollector {
    fn collect(&self, selection: &Selection) -> Result<Vec<RunHistory>> {
        let dir = run_dir(&self.root, selection);
        if !dir.is_dir() {
            debug!(dir = %dir.display(), "No run directory");
            return Ok(Vec::new());
        }

        let mut files: Vec<PathBuf> = WalkDir::new(&dir)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!(dir = %dir.display(), error = %e, "Skipping unreadable entry");
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file())
            .filter(|entry| {
                entry
                    .file_name()
                    .to_str()
                    .is_some_and(|name| RUN_FILE_RE.is_match(name))
            })
            .map(walkdir::DirEntry::into_path)
            .collect();
        files.sort();

        let mut runs = Vec::new();
        for path in &files {
            match Self::read_run_file(path) {
                Ok(mut file_runs) => runs.append(&mut file_runs),
                Err(e) => warn!(error = %e, "Skipping run file"),
            }
        }

        debug!(
            selection = %selection,
            files = files.len(),
            runs = runs.len(),
            "Collected runs"
        );
        Ok(runs)
    }
}

/// In-memory collector, mainly for tests and embedding.
#[derive(Debug, Clone, Default)]
pub struct StaticCollector {
    runs: BTreeMap<Selection, Vec<RunHistory>>,
}

impl StaticCollector {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, selection: Selection, runs: Vec<RunHistory>) {
        self.runs.entry(selection).or_default().extend(runs);
    }
}

impl RunCollector for StaticCollector {
    fn collect(&self, selection: &Selection) -> Result<Vec<RunHistory>> {
        Ok(self.runs.get(selection).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn selection() -> Selection {
        Selection {
            probset: "vbmc18".to_string(),
            prob: "goris2015".to_string(),
            subprob: "S7".to_string(),
            noise: String::new(),
            alg: "vbmc".to_string(),
            algset: "base".to_string(),
        }
    }

    const RUN: &str = r#"{"ticks":[10,20],"lnz":[1.0,1.2],"lnz_true":1.1}"#;

    #[test]
    fn run_dir_layout() {
        let mut sel = selection();
        assert_eq!(
            run_dir(Path::new("/d"), &sel),
            PathBuf::from("/d/vbmc18@goris2015/S7/vbmc@base")
        );
        sel.noise = "me".to_string();
        assert_eq!(
            run_dir(Path::new("/d"), &sel),
            PathBuf::from("/d/vbmc18@goris2015/S7@me/vbmc@base")
        );
    }

    #[test]
    fn missing_root_is_an_error() {
        let err = DirCollector::new("/definitely/not/a/dir").unwrap_err();
        assert!(matches!(err, PlotError::DataDirNotFound { .. }));
    }

    #[test]
    fn collects_files_in_name_order_and_skips_bad_ones() {
        let temp = TempDir::new().expect("temp dir");
        let dir = run_dir(temp.path(), &selection());
        fs::create_dir_all(&dir).expect("mkdir");
        fs::write(dir.join("b.json"), format!(r#"{{"runs":[{RUN}]}}"#)).expect("write");
        fs::write(dir.join("a.json"), format!("[{RUN},{RUN}]")).expect("write");
        fs::write(dir.join("broken.json"), "{not json").expect("write");
        fs::write(dir.join(".hidden.json"), format!("[{RUN}]")).expect("write");
        fs::write(dir.join("notes.txt"), "ignored").expect("write");

        let collector = DirCollector::new(temp.path()).expect("collector");
        let runs = collector.collect(&selection()).expect("collect");
        assert_eq!(runs.len(), 3);
    }

    #[test]
    fn missing_group_yields_no_runs() {
        let temp = TempDir::new().expect("temp dir");
        let collector = DirCollector::new(temp.path()).expect("collector");
        assert!(collector.collect(&selection()).expect("collect").is_empty());
    }

    #[test]
    fn static_collector_returns_inserted_runs() {
        let mut collector = StaticCollector::new();
        let run: RunHistory = serde_json::from_str(RUN).unwrap();
        collector.insert(selection(), vec![run.clone()]);
        assert_eq!(collector.collect(&selection()).unwrap(), vec![run]);
        assert!(collector.collect(&Selection::default()).unwrap().is_empty());
    }
}
