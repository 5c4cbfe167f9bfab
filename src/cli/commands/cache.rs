//! Cache command: inspect or delete the results cache.

use crate::cache::ResultCache;
use crate::cli::CacheCommands;
use crate::config::{CliOverrides, load_config};
use crate::error::Result;
use crate::format::{format_number, truncate_cell};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Serialize)]
struct EntrySummary {
    key: String,
    selection: String,
    runs: usize,
    final_median: Option<f64>,
    options_fingerprint: String,
}

/// Execute a cache subcommand.
///
/// # Errors
///
/// Returns an error if the cache file is corrupt (`show`) or cannot be
/// removed (`clear`).
pub fn execute(command: &CacheCommands, json: bool, config_path: Option<&Path>) -> Result<()> {
    match command {
        CacheCommands::Show { cache } => show(&cache_path(cache.as_ref(), config_path)?, json),
        CacheCommands::Clear { cache } => clear(&cache_path(cache.as_ref(), config_path)?, json),
    }
}

fn cache_path(explicit: Option<&PathBuf>, config_path: Option<&Path>) -> Result<PathBuf> {
    let overrides = CliOverrides {
        cache: explicit.cloned(),
        ..Default::default()
    };
    Ok(load_config(config_path, &overrides)?.cache_path)
}

fn show(path: &Path, json: bool) -> Result<()> {
    let cache = ResultCache::try_load(path)?.unwrap_or_default();
    let entries: Vec<EntrySummary> = cache
        .iter()
        .map(|(key, entry)| EntrySummary {
            key: key.clone(),
            selection: entry.selection.to_string(),
            runs: entry.histories.len(),
            final_median: entry.summary.as_ref().and_then(|s| s.final_median()),
            options_fingerprint: entry.options_fingerprint.clone(),
        })
        .collect();

    if json {
        let output = serde_json::json!({
            "path": path,
            "saved_at": cache.saved_at(),
            "entries": entries,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    if entries.is_empty() {
        println!("Cache {} is empty.", path.display());
        return Ok(());
    }
    match cache.saved_at() {
        Some(at) => println!("Cache {} (saved {})", path.display(), at.to_rfc3339()),
        None => println!("Cache {}", path.display()),
    }
    for entry in &entries {
        println!(
            "  {:<40} {:>4} runs  median {}",
            truncate_cell(&entry.key, 40),
            entry.runs,
            entry.final_median.map_or_else(|| "-".to_string(), format_number)
        );
    }
    Ok(())
}

fn clear(path: &Path, json: bool) -> Result<()> {
    let removed = ResultCache::clear(path)?;
    info!(path = %path.display(), removed, "Cleared cache");
    if json {
        let output = serde_json::json!({ "path": path, "removed": removed });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else if removed {
        println!("Removed {}", path.display());
    } else {
        println!("No cache at {}", path.display());
    }
    Ok(())
}
