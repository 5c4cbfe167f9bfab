use clap::Parser;
use infbench_plot::cli::commands;
use infbench_plot::cli::{Cli, Commands};
use infbench_plot::logging::init_logging;
use infbench_plot::{PlotError, StructuredError};
use std::io::{self, IsTerminal};

fn main() {
    let cli = Cli::parse();

    if let Err(e) = init_logging(cli.verbose, cli.quiet, cli.log_file.as_deref()) {
        eprintln!("Failed to initialize logging: {e}");
    }

    let config_path = cli.config.as_deref();

    let result = match &cli.command {
        Commands::Plot(args) => commands::plot::execute(args, cli.json, config_path),
        Commands::Summary(args) => commands::summary::execute(args, cli.json, config_path),
        Commands::Cache { command } => commands::cache::execute(command, cli.json, config_path),
        Commands::Config(args) => commands::config::execute(args, cli.json, config_path),
        Commands::Schema => commands::schema::execute(),
        Commands::Completions(args) => commands::completions::execute(args),
    };

    if let Err(e) = result {
        handle_error(&e, cli.json);
    }
}

/// Handle errors with structured output support.
///
/// When --json is set or stdout is not a TTY, outputs structured JSON to stderr.
/// Otherwise, outputs a human-readable error with optional color.
fn handle_error(err: &PlotError, json_mode: bool) -> ! {
    let structured = StructuredError::from_error(err);
    let exit_code = structured.code.exit_code();

    let use_json = json_mode || !io::stdout().is_terminal();

    if use_json {
        let json = structured.to_json();
        eprintln!(
            "{}",
            serde_json::to_string_pretty(&json).unwrap_or_else(|_| json.to_string())
        );
    } else {
        let use_color = io::stderr().is_terminal();
        eprintln!("{}", structured.to_human(use_color));
    }

    std::process::exit(exit_code);
}
