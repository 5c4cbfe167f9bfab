//! Shared utilities for `infbench_plot`.
//!
//! - Content hashing (SHA256) for cache validation
//! - Progress indicators for the panel loop
//! - Atomic file writes

pub mod hash;
pub mod progress;

pub use hash::{histories_fingerprint, options_fingerprint};

use std::fs;
use std::io::Write;
use std::path::Path;

/// Write `contents` to `path` via a sibling temp file and rename.
///
/// # Errors
///
/// Returns an error if the parent directory cannot be created or the temp
/// file cannot be written or renamed.
pub fn write_atomic(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let mut tmp_name = path
        .file_name()
        .map(std::ffi::OsStr::to_os_string)
        .unwrap_or_default();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    {
        let mut file = fs::File::create(&tmp_path)?;
        file.write_all(contents)?;
        file.sync_all()?;
    }
    fs::rename(&tmp_path, path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_atomic_creates_parent_and_replaces() {
        let temp = TempDir::new().expect("temp dir");
        let path = temp.path().join("nested").join("out.json");

        write_atomic(&path, b"first").expect("write");
        write_atomic(&path, b"second").expect("rewrite");

        assert_eq!(fs::read_to_string(&path).expect("read"), "second");
        assert!(!path.with_file_name("out.json.tmp").exists());
    }
}
