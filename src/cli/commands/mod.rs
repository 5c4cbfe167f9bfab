//! Command implementations.
//!
//! `plot` and `summary` share the same pipeline: resolve config, expand the
//! factor layout, collect or reuse run statistics, and persist the cache.

pub mod cache;
pub mod completions;
pub mod config;
pub mod plot;
pub mod schema;
pub mod summary;

use crate::aggregate::{Aggregation, aggregate};
use crate::cache::ResultCache;
use crate::cli::CacheArgs;
use crate::collect::DirCollector;
use crate::config::{CliOverrides, ResolvedConfig, load_config};
use crate::error::Result;
use crate::layout::{Ordering, PlotPlan, expand};
use std::path::Path;
use tracing::{debug, info};

/// Output of the shared aggregation pipeline.
pub struct Pipeline {
    pub config: ResolvedConfig,
    pub plan: PlotPlan,
    pub aggregation: Aggregation,
}

/// Resolve config, expand the layout and aggregate every layer.
///
/// # Errors
///
/// Returns an error for an invalid layout, a missing data directory, or a
/// cache that cannot be written when saving was requested.
pub fn run_pipeline(
    config_path: Option<&Path>,
    overrides: &CliOverrides,
    cache_args: &CacheArgs,
) -> Result<Pipeline> {
    let config = load_config(config_path, overrides)?;
    let ordering = Ordering::from_axes(&config.axes)?;
    let plan = expand(&config.factors, &ordering, config.options.two_rows)?;
    info!(
        figures = plan.figures.len(),
        panels = plan.panel_count(),
        jobs = plan.job_count(),
        layer_factor = %plan.layer_factor,
        "Expanded layout"
    );

    let collector = DirCollector::new(&config.data_dir)?;

    let mut cache = if cache_args.no_cache {
        debug!("Cache disabled");
        ResultCache::new()
    } else {
        ResultCache::load(&config.cache_path)
    };

    let aggregation = aggregate(&plan, &collector, &mut cache, &config.options)?;

    if cache_args.save_cache {
        if cache.is_dirty() {
            cache.save(&config.cache_path)?;
        } else {
            debug!(path = %config.cache_path.display(), "Cache unchanged; not saving");
        }
    }

    Ok(Pipeline {
        config,
        plan,
        aggregation,
    })
}
