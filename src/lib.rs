//! `infbench_plot` - aggregate and plot inference benchmark runs.
//!
//! The pipeline is a single synchronous pass:
//!
//! 1. [`config`] resolves [`PlotOptions`](config::PlotOptions) from defaults,
//!    a YAML file, environment variables and CLI flags.
//! 2. [`layout`] expands the six benchmark factors into a figure/panel/layer plan.
//! 3. [`cache`] and [`collect`] provide the per-run histories for each panel layer.
//! 4. [`aggregate`] (backed by [`stats`]) reduces histories to summary statistics.
//! 5. [`render`] draws the panel grids with `plotters`.
//! 6. [`format`] prints the summary table as text, CSV or JSON.

pub mod aggregate;
pub mod cache;
pub mod cli;
pub mod collect;
pub mod config;
pub mod error;
pub mod format;
pub mod layout;
pub mod logging;
pub mod model;
pub mod render;
pub mod stats;
pub mod util;

pub use error::{ErrorCode, PlotError, Result, StructuredError};
