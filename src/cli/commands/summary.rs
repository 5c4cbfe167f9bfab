//! Summary command implementation.
//!
//! Runs the aggregation pipeline without drawing and prints the
//! problem / subproblem / algorithm table.

use crate::cli::SummaryArgs;
use crate::cli::commands::run_pipeline;
use crate::error::Result;
use crate::format::{OutputFormat, csv, format_table, summary_rows, terminal_width};
use serde_json::json;
use std::io::{self, IsTerminal, Write};
use std::path::Path;

/// Execute the summary command.
///
/// `--json` wins over `--report`.
///
/// # Errors
///
/// Returns an error if aggregation fails or the report format is unknown.
pub fn execute(args: &SummaryArgs, json: bool, config_path: Option<&Path>) -> Result<()> {
    let format = if json {
        OutputFormat::Json
    } else {
        args.report
            .as_deref()
            .map_or(Ok(OutputFormat::Text), str::parse)?
    };

    let overrides = args.overrides();
    let pipeline = run_pipeline(config_path, &overrides, &args.cache)?;
    let rows = summary_rows(&pipeline.aggregation.table);

    match format {
        OutputFormat::Json => {
            let output = json!({
                "layer_factor": pipeline.plan.layer_factor,
                "aggregation": pipeline.aggregation.report,
                "table": rows,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Csv => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            csv::write_csv(&mut handle, &rows)?;
            handle.flush()?;
        }
        OutputFormat::Text => {
            print!("{}", format_table(&rows, io::stdout().is_terminal().then(terminal_width)));
        }
    }
    Ok(())
}
