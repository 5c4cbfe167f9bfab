//! Plot command implementation.

use crate::cli::PlotArgs;
use crate::cli::commands::run_pipeline;
use crate::error::Result;
use crate::format::{format_table, summary_rows, terminal_width};
use crate::render::{RenderTarget, render};
use serde_json::json;
use std::io::{self, IsTerminal};
use std::path::Path;
use tracing::info;

/// Execute the plot command.
///
/// # Errors
///
/// Returns an error if aggregation fails or a figure cannot be written.
pub fn execute(args: &PlotArgs, json: bool, config_path: Option<&Path>) -> Result<()> {
    let overrides = args.overrides();
    let pipeline = run_pipeline(config_path, &overrides, &args.cache)?;

    let target = RenderTarget {
        out_dir: pipeline.config.out_dir.clone(),
        name: pipeline.config.name.clone(),
        format: pipeline.config.format,
    };
    let rendered = render(
        &pipeline.plan,
        &pipeline.aggregation,
        &pipeline.config.options,
        &target,
    )?;
    info!(
        figures = rendered.figures.len(),
        panels = rendered.total_panels(),
        "Rendered figures"
    );

    let rows = summary_rows(&pipeline.aggregation.table);

    if json {
        let output = json!({
            "layer_factor": pipeline.plan.layer_factor,
            "aggregation": pipeline.aggregation.report,
            "table": rows,
            "figures": rendered.figures,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    print!("{}", format_table(&rows, io::stdout().is_terminal().then(terminal_width)));
    for figure in &rendered.figures {
        println!(
            "Wrote {} ({} panels, {} lines)",
            figure.path.display(),
            figure.panels,
            figure.layers_drawn
        );
    }
    Ok(())
}
