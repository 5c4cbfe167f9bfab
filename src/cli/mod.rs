//! CLI definitions and entry point.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::config::CliOverrides;
use crate::model::Factor;

pub mod commands;

/// Aggregate and plot inference benchmark runs
#[derive(Parser, Debug)]
#[command(name = "ibplot", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: ./ibplot.yaml if present)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (no output except errors)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Also write logs to this file
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Aggregate runs and draw the figure grid
    Plot(PlotArgs),

    /// Aggregate runs and print the summary table
    #[command(alias = "stats")]
    Summary(SummaryArgs),

    /// Inspect or delete the results cache
    Cache {
        #[command(subcommand)]
        command: CacheCommands,
    },

    /// Show resolved options and where each came from
    Config(ConfigArgs),

    /// Print the JSON schema of run files
    Schema,

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Factor labels and axis assignment.
#[derive(Args, Debug, Clone, Default)]
pub struct SelectArgs {
    /// Problem sets (comma-separated; empty entries are skipped)
    #[arg(long, value_name = "LABELS")]
    pub probset: Option<String>,

    /// Problems
    #[arg(long, value_name = "LABELS")]
    pub prob: Option<String>,

    /// Subproblems (e.g. dimensions or subjects)
    #[arg(long, value_name = "LABELS")]
    pub subprob: Option<String>,

    /// Noise levels
    #[arg(long, value_name = "LABELS")]
    pub noise: Option<String>,

    /// Algorithms
    #[arg(long, value_name = "LABELS")]
    pub alg: Option<String>,

    /// Algorithm settings
    #[arg(long, value_name = "LABELS")]
    pub algset: Option<String>,

    /// Factor laid out along panel rows (default: prob)
    #[arg(long, value_name = "FACTOR")]
    pub rows: Option<String>,

    /// Factor laid out along panel columns (default: subprob)
    #[arg(long, value_name = "FACTOR")]
    pub cols: Option<String>,

    /// Factor split into separate figures
    #[arg(long, value_name = "FACTOR")]
    pub figs: Option<String>,

    /// Factor drawn as lines within a panel (default: first multi-label factor)
    #[arg(long, value_name = "FACTOR")]
    pub layers: Option<String>,

    /// Run data directory
    #[arg(long = "data", value_name = "DIR")]
    pub data_dir: Option<PathBuf>,
}

/// Options that change the aggregated numbers.
#[derive(Args, Debug, Clone, Default)]
pub struct StatsArgs {
    /// Error metric: abs, zscore or gskl
    #[arg(long = "metric", value_name = "METRIC")]
    pub error_metric: Option<String>,

    /// Keep the best run of each consecutive group of N
    #[arg(long, value_name = "N")]
    pub best_of: Option<usize>,

    /// Floor applied to errors (log axis)
    #[arg(long, value_name = "VALUE")]
    pub zero_floor: Option<f64>,

    /// Final error at or below which a run counts as solved
    #[arg(long, value_name = "VALUE")]
    pub solve_threshold: Option<f64>,

    /// Bootstrap resamples for the final-median interval (0 disables)
    #[arg(long, value_name = "N")]
    pub samples: Option<usize>,

    /// Bootstrap seed
    #[arg(long, value_name = "SEED")]
    pub seed: Option<u64>,

    /// Lower and upper band quantiles
    #[arg(long, value_name = "LO,HI")]
    pub quantiles: Option<String>,

    /// Use raw log-evidence estimates instead of errors
    #[arg(long)]
    pub absolute: bool,
}

/// Results cache handling.
#[derive(Args, Debug, Clone, Default)]
pub struct CacheArgs {
    /// Cache file
    #[arg(long, value_name = "PATH")]
    pub cache: Option<PathBuf>,

    /// Ignore any existing cache
    #[arg(long, conflicts_with = "save_cache")]
    pub no_cache: bool,

    /// Write collected and recomputed entries back to the cache
    #[arg(long)]
    pub save_cache: bool,
}

/// Drawing options.
#[derive(Args, Debug, Clone, Default)]
pub struct DrawArgs {
    /// Output directory for figures
    #[arg(long, short = 'o', value_name = "DIR")]
    pub out_dir: Option<PathBuf>,

    /// Figure file name stem
    #[arg(long, value_name = "NAME")]
    pub name: Option<String>,

    /// Image format: svg or png
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<String>,

    /// Layer drawing: shaded (median + band) or line
    #[arg(long, value_name = "TYPE")]
    pub plot_type: Option<String>,

    /// Wrap a single row of panels into two rows
    #[arg(long)]
    pub two_rows: bool,

    /// x-axis limits
    #[arg(long, value_name = "LO,HI", allow_hyphen_values = true)]
    pub x_lim: Option<String>,

    /// y-axis limits
    #[arg(long, value_name = "LO,HI", allow_hyphen_values = true)]
    pub y_lim: Option<String>,

    /// Print the final median next to each line
    #[arg(long)]
    pub annotate: bool,

    /// Layer index drawn with a thicker line
    #[arg(long, value_name = "INDEX")]
    pub enhance: Option<usize>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct PlotArgs {
    #[command(flatten)]
    pub select: SelectArgs,

    #[command(flatten)]
    pub stats: StatsArgs,

    #[command(flatten)]
    pub cache: CacheArgs,

    #[command(flatten)]
    pub draw: DrawArgs,
}

#[derive(Args, Debug, Clone, Default)]
pub struct SummaryArgs {
    #[command(flatten)]
    pub select: SelectArgs,

    #[command(flatten)]
    pub stats: StatsArgs,

    #[command(flatten)]
    pub cache: CacheArgs,

    /// Report format: text, csv or json
    #[arg(long, value_name = "FORMAT")]
    pub report: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum CacheCommands {
    /// List cached entries
    Show {
        /// Cache file
        #[arg(long, value_name = "PATH")]
        cache: Option<PathBuf>,
    },
    /// Delete the cache file
    Clear {
        /// Cache file
        #[arg(long, value_name = "PATH")]
        cache: Option<PathBuf>,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct ConfigArgs {
    /// Print a single resolved key
    #[arg(long, short = 'g', value_name = "KEY")]
    pub get: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: ShellType,

    /// Output file (default: stdout)
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

/// Supported shells for completion generation.
#[derive(ValueEnum, Debug, Clone, Copy, Eq, PartialEq)]
pub enum ShellType {
    /// Bash shell
    Bash,
    /// Zsh shell
    Zsh,
    /// Fish shell
    Fish,
    #[value(name = "powershell")]
    #[value(alias = "pwsh")]
    /// `PowerShell`
    PowerShell,
    /// Elvish
    Elvish,
}

impl SelectArgs {
    fn apply(&self, overrides: &mut CliOverrides) {
        let labels = [
            (Factor::ProbSet, &self.probset),
            (Factor::Prob, &self.prob),
            (Factor::SubProb, &self.subprob),
            (Factor::Noise, &self.noise),
            (Factor::Alg, &self.alg),
            (Factor::AlgSet, &self.algset),
        ];
        overrides.labels = labels
            .into_iter()
            .filter_map(|(factor, value)| value.clone().map(|v| (factor, v)))
            .collect::<BTreeMap<_, _>>();
        overrides.rows.clone_from(&self.rows);
        overrides.cols.clone_from(&self.cols);
        overrides.figs.clone_from(&self.figs);
        overrides.layers.clone_from(&self.layers);
        overrides.data_dir.clone_from(&self.data_dir);
    }
}

impl StatsArgs {
    fn apply(&self, overrides: &mut CliOverrides) {
        overrides.error_metric.clone_from(&self.error_metric);
        overrides.best_of = self.best_of;
        overrides.zero_floor = self.zero_floor;
        overrides.solve_threshold = self.solve_threshold;
        overrides.samples = self.samples;
        overrides.seed = self.seed;
        overrides.quantiles.clone_from(&self.quantiles);
        overrides.absolute = self.absolute.then_some(true);
    }
}

impl DrawArgs {
    fn apply(&self, overrides: &mut CliOverrides) {
        overrides.out_dir.clone_from(&self.out_dir);
        overrides.name.clone_from(&self.name);
        overrides.format.clone_from(&self.format);
        overrides.plot_type.clone_from(&self.plot_type);
        overrides.two_rows = self.two_rows.then_some(true);
        overrides.x_lim.clone_from(&self.x_lim);
        overrides.y_lim.clone_from(&self.y_lim);
        overrides.annotate = self.annotate.then_some(true);
        overrides.enhance = self.enhance;
    }
}

impl PlotArgs {
    /// Config overrides carried by this invocation.
    #[must_use]
    pub fn overrides(&self) -> CliOverrides {
        let mut overrides = CliOverrides::default();
        self.select.apply(&mut overrides);
        self.stats.apply(&mut overrides);
        self.draw.apply(&mut overrides);
        overrides.cache.clone_from(&self.cache.cache);
        overrides
    }
}

impl SummaryArgs {
    /// Config overrides carried by this invocation.
    #[must_use]
    pub fn overrides(&self) -> CliOverrides {
        let mut overrides = CliOverrides::default();
        self.select.apply(&mut overrides);
        self.stats.apply(&mut overrides);
        overrides.cache.clone_from(&self.cache.cache);
        overrides
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn plot_flags_become_overrides() {
        let cli = Cli::try_parse_from([
            "ibplot",
            "plot",
            "--prob",
            "goris2015,akrami2018",
            "--alg",
            "vbmc,,bmc",
            "--rows",
            "alg",
            "--best-of",
            "3",
            "--two-rows",
            "--y-lim",
            "-5,5",
        ])
        .unwrap();
        let Commands::Plot(args) = cli.command else {
            panic!("expected plot");
        };
        let overrides = args.overrides();
        assert_eq!(
            overrides.labels.get(&Factor::Alg).map(String::as_str),
            Some("vbmc,,bmc")
        );
        assert_eq!(overrides.rows.as_deref(), Some("alg"));
        assert_eq!(overrides.best_of, Some(3));
        assert_eq!(overrides.two_rows, Some(true));
        assert_eq!(overrides.annotate, None);
        assert_eq!(overrides.y_lim.as_deref(), Some("-5,5"));
    }

    #[test]
    fn no_cache_conflicts_with_save_cache() {
        let result = Cli::try_parse_from(["ibplot", "summary", "--no-cache", "--save-cache"]);
        assert!(result.is_err());
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["ibplot", "summary", "--json", "-vv"]).unwrap();
        assert!(cli.json);
        assert_eq!(cli.verbose, 2);
    }
}
