//! Results cache.
//!
//! Maps a composite panel key (`row_col_layer`, optionally prefixed by the
//! figure label) to the run histories collected for it, the summary computed
//! from them and the fingerprint of the options that summary was computed
//! with. The cache is a single JSON file; loading never fails (a missing or
//! corrupt file yields an empty cache).

use crate::error::{PlotError, Result};
use crate::model::{RunHistory, Selection, SummaryStat};
use crate::util::{histories_fingerprint, write_atomic};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

const CACHE_VERSION: u32 = 1;

/// One cached panel layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub selection: Selection,
    pub histories: Vec<RunHistory>,
    /// Summary computed with `options_fingerprint`; `None` when the group had
    /// no usable runs.
    #[serde(default)]
    pub summary: Option<SummaryStat>,
    pub options_fingerprint: String,
    #[serde(default)]
    pub histories_fingerprint: String,
}

impl CacheEntry {
    #[must_use]
    pub fn new(
        selection: Selection,
        histories: Vec<RunHistory>,
        summary: Option<SummaryStat>,
        options_fingerprint: String,
    ) -> Self {
        let histories_fingerprint = histories_fingerprint(&histories);
        Self {
            selection,
            histories,
            summary,
            options_fingerprint,
            histories_fingerprint,
        }
    }

    /// The stored summary, if it was computed with the given options and the
    /// stored histories are intact.
    #[must_use]
    pub fn summary_for(&self, options_fingerprint: &str) -> Option<&SummaryStat> {
        if self.options_fingerprint != options_fingerprint {
            return None;
        }
        if !self.histories_fingerprint.is_empty()
            && self.histories_fingerprint != histories_fingerprint(&self.histories)
        {
            return None;
        }
        self.summary.as_ref()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct CacheFile {
    version: u32,
    #[serde(default)]
    saved_at: Option<DateTime<Utc>>,
    #[serde(default)]
    entries: BTreeMap<String, CacheEntry>,
}

/// In-memory results cache.
#[derive(Debug, Clone, Default)]
pub struct ResultCache {
    entries: BTreeMap<String, CacheEntry>,
    saved_at: Option<DateTime<Utc>>,
    dirty: bool,
}

impl ResultCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a cache file, degrading to an empty cache on any problem.
    #[must_use]
    pub fn load(path: &Path) -> Self {
        match Self::try_load(path) {
            Ok(Some(cache)) => {
                debug!(path = %path.display(), entries = cache.len(), "Loaded cache");
                cache
            }
            Ok(None) => {
                debug!(path = %path.display(), "No cache file");
                Self::new()
            }
            Err(e) => {
                warn!(error = %e, "Ignoring unreadable cache");
                Self::new()
            }
        }
    }

    /// Load a cache file, reporting problems.
    ///
    /// Returns `Ok(None)` when the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns `CacheCorrupt` if the file cannot be read or parsed, or was
    /// written by an incompatible version.
    pub fn try_load(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let corrupt = |reason: String| PlotError::CacheCorrupt {
            path: path.to_path_buf(),
            reason,
        };
        let contents = fs::read_to_string(path).map_err(|e| corrupt(e.to_string()))?;
        let file: CacheFile = serde_json::from_str(&contents).map_err(|e| corrupt(e.to_string()))?;
        if file.version != CACHE_VERSION {
            return Err(corrupt(format!(
                "unsupported cache version {} (expected {CACHE_VERSION})",
                file.version
            )));
        }
        Ok(Some(Self {
            entries: file.entries,
            saved_at: file.saved_at,
            dirty: false,
        }))
    }

    /// Persist the cache atomically and clear the dirty flag.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn save(&mut self, path: &Path) -> Result<()> {
        let saved_at = Utc::now();
        let file = CacheFile {
            version: CACHE_VERSION,
            saved_at: Some(saved_at),
            entries: self.entries.clone(),
        };
        let json = serde_json::to_vec_pretty(&file)?;
        write_atomic(path, &json)?;
        self.saved_at = Some(saved_at);
        self.dirty = false;
        info!(path = %path.display(), entries = self.entries.len(), "Saved cache");
        Ok(())
    }

    /// Delete a cache file. Returns whether a file was removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be removed.
    pub fn clear(path: &Path) -> Result<bool> {
        match fs::remove_file(path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&CacheEntry> {
        self.entries.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, entry: CacheEntry) {
        self.entries.insert(key.into(), entry);
        self.dirty = true;
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &CacheEntry)> {
        self.entries.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether entries were added since the last load or save.
    #[must_use]
    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    #[must_use]
    pub const fn saved_at(&self) -> Option<DateTime<Utc>> {
        self.saved_at
    }
}
