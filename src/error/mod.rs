//! Error types and handling for `infbench_plot`.
//!
//! # Design
//!
//! - Uses `thiserror` for derive-based error types
//! - Supports `anyhow` integration through [`PlotError::Other`]
//! - Provides recovery hints for user-facing errors
//! - Separates recoverable per-run/per-file problems (logged and skipped by
//!   the aggregator) from fatal ones (bad layout, missing data directory)

mod structured;

pub use structured::{ErrorCode, StructuredError, find_similar};

use std::path::PathBuf;
use thiserror::Error;

/// Primary error type for `infbench_plot` operations.
#[derive(Error, Debug)]
pub enum PlotError {
    // === Layout Errors ===
    /// Factor name not recognized.
    #[error("Unknown factor: {name}")]
    UnknownFactor { name: String },

    /// Axis assignment is not usable (e.g. same factor on rows and columns).
    #[error("Invalid layout: {reason}")]
    InvalidLayout { reason: String },

    // === Data Errors ===
    /// Run data directory does not exist.
    #[error("Run data directory not found at '{path}'")]
    DataDirNotFound { path: PathBuf },

    /// A run file could not be parsed.
    #[error("Malformed run file '{path}': {reason}")]
    RunFile { path: PathBuf, reason: String },

    /// Overhead series of a single run is unusable.
    #[error("Malformed overhead: {reason}")]
    MalformedOverhead { reason: String },

    /// Cache file exists but cannot be decoded.
    #[error("Corrupt cache '{path}': {reason}")]
    CacheCorrupt { path: PathBuf, reason: String },

    // === Output Errors ===
    /// Figure drawing failed.
    #[error("Failed to render '{path}': {reason}")]
    Render { path: PathBuf, reason: String },

    // === Configuration Errors ===
    /// Configuration file error.
    #[error("Configuration error: {0}")]
    Config(String),

    // === I/O Errors ===
    /// File system I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Wrapped anyhow error.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PlotError {
    /// Human-friendly suggestion for fixing this error.
    #[must_use]
    pub const fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::UnknownFactor { .. } => {
                Some("Valid factors: probset, prob, subprob, noise, alg, algset")
            }
            Self::InvalidLayout { .. } => {
                Some("Assign different factors to --rows, --cols, --figs and --layers")
            }
            Self::DataDirNotFound { .. } => Some("Check --data or set IBPLOT_DATA_DIR"),
            Self::CacheCorrupt { .. } => Some("Run: ibplot cache clear"),
            _ => None,
        }
    }

    /// Create an invalid-layout error.
    #[must_use]
    pub fn layout(reason: impl Into<String>) -> Self {
        Self::InvalidLayout {
            reason: reason.into(),
        }
    }

    /// Create a malformed-overhead error.
    #[must_use]
    pub fn overhead(reason: impl Into<String>) -> Self {
        Self::MalformedOverhead {
            reason: reason.into(),
        }
    }

    /// Create a render error for an output path.
    #[must_use]
    pub fn render(path: impl Into<PathBuf>, reason: impl std::fmt::Display) -> Self {
        Self::Render {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

/// Result type using `PlotError`.
pub type Result<T> = std::result::Result<T, PlotError>;
