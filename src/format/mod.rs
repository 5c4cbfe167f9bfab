//! Output formatting for `infbench_plot`.
//!
//! Supports a human-readable text table, machine-parseable JSON, and CSV
//! export of the summary table. JSON and CSV go to stdout with diagnostics
//! on stderr.

pub mod csv;
mod rows;
mod text;

pub use rows::{SummaryRow, summary_rows};
pub use text::{format_number, format_table, terminal_width, truncate_cell};

use serde::Serialize;
use std::str::FromStr;

use crate::error::PlotError;

/// Report format for summary output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Csv,
}

impl FromStr for OutputFormat {
    type Err = PlotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "text" | "table" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            other => Err(PlotError::Config(format!("unknown output format '{other}'"))),
        }
    }
}
