//! Structured error output.
//!
//! Provides machine-parseable error information with:
//! - Error codes for categorization
//! - Hints for self-correction
//! - Per-category exit codes
//! - Context for debugging

use crate::error::PlotError;
use crate::model::Factor;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Machine-readable error codes.
///
/// Format: `SCREAMING_SNAKE_CASE` for easy parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    // === Layout Errors (exit code 2) ===
    /// Factor name not recognized
    UnknownFactor,
    /// Axis assignment unusable
    InvalidLayout,

    // === Data Errors (exit code 3) ===
    /// Run data directory missing
    DataDirNotFound,
    /// Run file could not be parsed
    RunFileError,
    /// Overhead series malformed
    MalformedOverhead,
    /// Cache file cannot be decoded
    CacheCorrupt,

    // === Output Errors (exit code 4) ===
    /// Figure drawing failed
    RenderError,

    // === Config Errors (exit code 7) ===
    /// General config error
    ConfigError,

    // === I/O Errors (exit code 8) ===
    /// File I/O error
    IoError,
    /// JSON serialization error
    JsonError,
    /// YAML parsing error
    YamlError,

    // === Internal Errors (exit code 1) ===
    /// Unexpected internal error
    InternalError,
}

impl ErrorCode {
    /// Get the string representation for JSON output.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::UnknownFactor => "UNKNOWN_FACTOR",
            Self::InvalidLayout => "INVALID_LAYOUT",
            Self::DataDirNotFound => "DATA_DIR_NOT_FOUND",
            Self::RunFileError => "RUN_FILE_ERROR",
            Self::MalformedOverhead => "MALFORMED_OVERHEAD",
            Self::CacheCorrupt => "CACHE_CORRUPT",
            Self::RenderError => "RENDER_ERROR",
            Self::ConfigError => "CONFIG_ERROR",
            Self::IoError => "IO_ERROR",
            Self::JsonError => "JSON_ERROR",
            Self::YamlError => "YAML_ERROR",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Whether fixing the input and re-running is likely to succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::UnknownFactor | Self::InvalidLayout | Self::DataDirNotFound | Self::CacheCorrupt
        )
    }

    /// Get the exit code for this error category.
    ///
    /// - 1: Internal/unknown errors
    /// - 2: Layout errors
    /// - 3: Data errors
    /// - 4: Output errors
    /// - 7: Config errors
    /// - 8: I/O errors
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::UnknownFactor | Self::InvalidLayout => 2,
            Self::DataDirNotFound
            | Self::RunFileError
            | Self::MalformedOverhead
            | Self::CacheCorrupt => 3,
            Self::RenderError => 4,
            Self::ConfigError => 7,
            Self::IoError | Self::JsonError | Self::YamlError => 8,
            Self::InternalError => 1,
        }
    }
}

/// Structured error for machine-parseable output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredError {
    /// Machine-readable error code
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Optional hint for fixing the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    /// Whether the operation can be retried
    pub retryable: bool,
    /// Additional context data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
}

impl StructuredError {
    /// Create a new structured error from a `PlotError`.
    #[must_use]
    pub fn from_error(err: &PlotError) -> Self {
        let (code, context) = Self::extract_code_and_context(err);
        let hint = Self::generate_hint(err);

        Self {
            code,
            message: err.to_string(),
            hint,
            retryable: code.is_retryable(),
            context,
        }
    }

    /// Convert to JSON value for output.
    #[must_use]
    pub fn to_json(&self) -> Value {
        json!({
            "error": {
                "code": self.code.as_str(),
                "message": self.message,
                "hint": self.hint,
                "retryable": self.retryable,
                "context": self.context,
            }
        })
    }

    /// Format for human-readable output.
    #[must_use]
    pub fn to_human(&self, color: bool) -> String {
        let mut output = String::new();

        if color {
            output.push_str("\x1b[31mError:\x1b[0m ");
        } else {
            output.push_str("Error: ");
        }

        output.push_str(&self.message);

        if let Some(hint) = &self.hint {
            output.push('\n');
            if color {
                output.push_str("\x1b[33mHint:\x1b[0m ");
            } else {
                output.push_str("Hint: ");
            }
            output.push_str(hint);
        }

        output
    }

    fn extract_code_and_context(err: &PlotError) -> (ErrorCode, Option<Value>) {
        match err {
            PlotError::UnknownFactor { name } => {
                (ErrorCode::UnknownFactor, Some(json!({"provided": name})))
            }
            PlotError::InvalidLayout { reason } => {
                (ErrorCode::InvalidLayout, Some(json!({"reason": reason})))
            }
            PlotError::DataDirNotFound { path } => (
                ErrorCode::DataDirNotFound,
                Some(json!({"path": path.display().to_string()})),
            ),
            PlotError::RunFile { path, reason } => (
                ErrorCode::RunFileError,
                Some(json!({"path": path.display().to_string(), "reason": reason})),
            ),
            PlotError::MalformedOverhead { reason } => {
                (ErrorCode::MalformedOverhead, Some(json!({"reason": reason})))
            }
            PlotError::CacheCorrupt { path, reason } => (
                ErrorCode::CacheCorrupt,
                Some(json!({"path": path.display().to_string(), "reason": reason})),
            ),
            PlotError::Render { path, .. } => (
                ErrorCode::RenderError,
                Some(json!({"path": path.display().to_string()})),
            ),
            PlotError::Config(_) => (ErrorCode::ConfigError, None),
            PlotError::Io(_) => (ErrorCode::IoError, None),
            PlotError::Json(_) => (ErrorCode::JsonError, None),
            PlotError::Yaml(_) => (ErrorCode::YamlError, None),
            PlotError::Other(_) => (ErrorCode::InternalError, None),
        }
    }

    fn generate_hint(err: &PlotError) -> Option<String> {
        if let PlotError::UnknownFactor { name } = err {
            let names: Vec<String> = Factor::ALL.iter().map(ToString::to_string).collect();
            let similar = find_similar(name, &names, 1);
            if let Some(best) = similar.first() {
                return Some(format!("Did you mean '{best}'?"));
            }
        }
        err.suggestion().map(str::to_string)
    }
}

// === Levenshtein Distance ===

fn levenshtein_distance(a: &str, b: &str) -> usize {
    let a_len = a.chars().count();
    let b_len = b.chars().count();

    if a_len == 0 {
        return b_len;
    }
    if b_len == 0 {
        return a_len;
    }

    let mut matrix = vec![vec![0; b_len + 1]; a_len + 1];

    for (i, row) in matrix.iter_mut().enumerate().take(a_len + 1) {
        row[0] = i;
    }
    for (j, item) in matrix[0].iter_mut().enumerate().take(b_len + 1) {
        *item = j;
    }

    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();

    for (i, a_char) in a_chars.iter().enumerate() {
        for (j, b_char) in b_chars.iter().enumerate() {
            let cost = usize::from(a_char != b_char);
            matrix[i + 1][j + 1] = std::cmp::min(
                std::cmp::min(matrix[i][j + 1] + 1, matrix[i + 1][j] + 1),
                matrix[i][j] + cost,
            );
        }
    }

    matrix[a_len][b_len]
}

/// Find candidates close to `searched` (Levenshtein distance <= 3).
///
/// Results are sorted by distance, then alphabetically.
#[must_use]
pub fn find_similar(searched: &str, existing: &[String], max_suggestions: usize) -> Vec<String> {
    let searched = searched.to_lowercase();
    let mut candidates: Vec<(usize, &str)> = existing
        .iter()
        .map(|name| (levenshtein_distance(&searched, name), name.as_str()))
        .filter(|(dist, _)| *dist <= 3)
        .collect();

    candidates.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(b.1)));

    candidates
        .into_iter()
        .take(max_suggestions)
        .map(|(_, name)| name.to_string())
        .collect()
}
