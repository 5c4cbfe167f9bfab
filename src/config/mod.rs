//! Configuration management for `infbench_plot`.
//!
//! Configuration sources and precedence (highest wins):
//! 1. CLI overrides
//! 2. Environment variables (`IBPLOT_*`)
//! 3. Config file (`ibplot.yaml` in the working directory, or `--config`)
//! 4. Defaults
//!
//! Resolution never fails on bad values: a missing, empty or unparseable
//! option falls back to its default (unparseable ones with a warning).

use crate::error::Result;
use crate::model::{ErrorMetric, Factor, FactorSet, PlotType};
use crate::util::hash::options_fingerprint;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, warn};

/// Default config filename looked up in the working directory.
pub const DEFAULT_CONFIG_FILENAME: &str = "ibplot.yaml";
/// Prefix for environment overrides.
const ENV_PREFIX: &str = "IBPLOT_";

const DEFAULT_DATA_DIR: &str = "runs";
const DEFAULT_CACHE_FILENAME: &str = "ibplot-cache.json";
const DEFAULT_OUT_DIR: &str = "plots";
const DEFAULT_FIGURE_NAME: &str = "infbench";

/// Statistics and drawing options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlotOptions {
    pub error_metric: ErrorMetric,
    pub best_of: usize,
    pub zero_floor: f64,
    pub solve_threshold: f64,
    pub samples: usize,
    pub seed: u64,
    pub quantiles: [f64; 2],
    pub plot_type: PlotType,
    pub two_rows: bool,
    pub x_lim: Option<[f64; 2]>,
    pub y_lim: Option<[f64; 2]>,
    pub absolute: bool,
    pub annotate: bool,
    pub enhance: Option<usize>,
}

impl Default for PlotOptions {
    fn default() -> Self {
        Self {
            error_metric: ErrorMetric::Abs,
            best_of: 1,
            zero_floor: 1e-3,
            solve_threshold: 1.0,
            samples: 1000,
            seed: 0,
            quantiles: [0.25, 0.75],
            plot_type: PlotType::Shaded,
            two_rows: false,
            x_lim: None,
            y_lim: None,
            absolute: false,
            annotate: false,
            enhance: None,
        }
    }
}

impl PlotOptions {
    /// Fill every option from a merged layer, defaulting what is missing.
    #[must_use]
    pub fn resolve(layer: &ConfigLayer) -> Self {
        let d = Self::default();

        let best_of = parse_or(layer, "best-of", d.best_of);
        let zero_floor = parse_or(layer, "zero-floor", d.zero_floor);
        let solve_threshold = parse_or(layer, "solve-threshold", d.solve_threshold);
        let quantiles = match pair_from_layer(layer, "quantiles") {
            Some(pair) if valid_band(pair) => pair,
            Some(pair) => {
                warn!(
                    lower = pair[0],
                    upper = pair[1],
                    "Band quantiles must bracket the median, using default"
                );
                d.quantiles
            }
            None => d.quantiles,
        };

        Self {
            error_metric: parse_or(layer, "error-metric", d.error_metric),
            best_of: if best_of == 0 { d.best_of } else { best_of },
            zero_floor: positive_or(zero_floor, d.zero_floor),
            solve_threshold: positive_or(solve_threshold, d.solve_threshold),
            samples: parse_or(layer, "samples", d.samples),
            seed: parse_or(layer, "seed", d.seed),
            quantiles,
            plot_type: parse_or(layer, "plot-type", d.plot_type),
            two_rows: bool_or(layer, "two-rows", d.two_rows),
            x_lim: pair_from_layer(layer, "x-lim").filter(|[lo, hi]| lo < hi),
            y_lim: pair_from_layer(layer, "y-lim").filter(|[lo, hi]| lo < hi),
            absolute: bool_or(layer, "absolute", d.absolute),
            annotate: bool_or(layer, "annotate", d.annotate),
            enhance: layer.get("enhance").and_then(|v| v.trim().parse().ok()),
        }
    }

    /// Hash of the options that change aggregated numbers.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        options_fingerprint(self)
    }
}

/// Where a resolved value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigSource {
    Default,
    File,
    Env,
    Cli,
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Default => "default",
            Self::File => "file",
            Self::Env => "env",
            Self::Cli => "cli",
        };
        write!(f, "{s}")
    }
}

/// A flat key/value configuration layer with normalized keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigLayer {
    pub values: BTreeMap<String, String>,
}

impl ConfigLayer {
    /// Insert a value under its normalized key.
    pub fn insert(&mut self, key: &str, value: impl Into<String>) {
        self.values.insert(normalize_key(key), value.into());
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&String> {
        self.values.get(&normalize_key(key))
    }

    /// Merge another layer on top of this one (higher precedence wins).
    pub fn merge_from(&mut self, other: &Self) {
        for (key, value) in &other.values {
            self.values.insert(key.clone(), value.clone());
        }
    }

    /// Build a layer from a YAML file path. Missing files return empty config.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn from_yaml(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)?;
        let value: serde_yaml::Value = serde_yaml::from_str(&contents)?;
        let mut flat = BTreeMap::new();
        flatten_yaml(&value, "", &mut flat);

        let mut layer = Self::default();
        for (key, value) in flat {
            layer.insert(&key, value);
        }
        debug!(path = %path.display(), keys = layer.values.len(), "Loaded config file");
        Ok(layer)
    }

    /// Build a layer from `IBPLOT_*` environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_env_vars(env::vars())
    }

    /// Build a layer from an explicit list of environment pairs.
    #[must_use]
    pub fn from_env_vars<I>(vars: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut layer = Self::default();
        for (key, value) in vars {
            if let Some(stripped) = key.strip_prefix(ENV_PREFIX) {
                layer.insert(stripped, value);
            }
        }
        layer
    }
}

/// CLI overrides for config loading (all optional).
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub data_dir: Option<PathBuf>,
    pub cache: Option<PathBuf>,
    pub out_dir: Option<PathBuf>,
    pub name: Option<String>,
    pub format: Option<String>,
    pub error_metric: Option<String>,
    pub best_of: Option<usize>,
    pub zero_floor: Option<f64>,
    pub solve_threshold: Option<f64>,
    pub samples: Option<usize>,
    pub seed: Option<u64>,
    pub quantiles: Option<String>,
    pub plot_type: Option<String>,
    pub two_rows: Option<bool>,
    pub x_lim: Option<String>,
    pub y_lim: Option<String>,
    pub absolute: Option<bool>,
    pub annotate: Option<bool>,
    pub enhance: Option<usize>,
    /// Raw comma-separated label lists per factor.
    pub labels: BTreeMap<Factor, String>,
    pub rows: Option<String>,
    pub cols: Option<String>,
    pub figs: Option<String>,
    pub layers: Option<String>,
}

impl CliOverrides {
    #[must_use]
    pub fn as_layer(&self) -> ConfigLayer {
        let mut layer = ConfigLayer::default();

        let mut put = |key: &str, value: Option<String>| {
            if let Some(value) = value {
                layer.insert(key, value);
            }
        };

        put("data-dir", self.data_dir.as_ref().map(|p| p.to_string_lossy().to_string()));
        put("cache", self.cache.as_ref().map(|p| p.to_string_lossy().to_string()));
        put("out-dir", self.out_dir.as_ref().map(|p| p.to_string_lossy().to_string()));
        put("name", self.name.clone());
        put("format", self.format.clone());
        put("error-metric", self.error_metric.clone());
        put("best-of", self.best_of.map(|v| v.to_string()));
        put("zero-floor", self.zero_floor.map(|v| v.to_string()));
        put("solve-threshold", self.solve_threshold.map(|v| v.to_string()));
        put("samples", self.samples.map(|v| v.to_string()));
        put("seed", self.seed.map(|v| v.to_string()));
        put("quantiles", self.quantiles.clone());
        put("plot-type", self.plot_type.clone());
        put("two-rows", self.two_rows.map(|v| v.to_string()));
        put("x-lim", self.x_lim.clone());
        put("y-lim", self.y_lim.clone());
        put("absolute", self.absolute.map(|v| v.to_string()));
        put("annotate", self.annotate.map(|v| v.to_string()));
        put("enhance", self.enhance.map(|v| v.to_string()));
        put("rows", self.rows.clone());
        put("cols", self.cols.clone());
        put("figs", self.figs.clone());
        put("layers", self.layers.clone());
        for (factor, labels) in &self.labels {
            put(factor.as_str(), Some(labels.clone()));
        }

        layer
    }
}

/// Output image format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    #[default]
    Svg,
    Png,
}

impl ImageFormat {
    #[must_use]
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Svg => "svg",
            Self::Png => "png",
        }
    }
}

impl FromStr for ImageFormat {
    type Err = crate::error::PlotError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "svg" => Ok(Self::Svg),
            "png" => Ok(Self::Png),
            other => Err(crate::error::PlotError::Config(format!(
                "unknown image format '{other}'"
            ))),
        }
    }
}

/// Factor names assigned to each plot axis, as configured.
///
/// Names are validated when the layout is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AxisNames {
    pub rows: String,
    pub cols: String,
    pub figs: Option<String>,
    pub layers: Option<String>,
}

impl Default for AxisNames {
    fn default() -> Self {
        Self {
            rows: Factor::Prob.as_str().to_string(),
            cols: Factor::SubProb.as_str().to_string(),
            figs: None,
            layers: None,
        }
    }
}

/// Split a comma-separated label list; empty entries are kept as holes.
#[must_use]
pub fn split_labels(value: &str) -> Vec<String> {
    value.split(',').map(|l| l.trim().to_string()).collect()
}

/// Fully resolved configuration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedConfig {
    pub options: PlotOptions,
    pub factors: FactorSet,
    pub axes: AxisNames,
    pub data_dir: PathBuf,
    pub cache_path: PathBuf,
    pub out_dir: PathBuf,
    pub name: String,
    pub format: ImageFormat,
    /// Source of each explicitly set key.
    pub sources: BTreeMap<String, ConfigSource>,
}

impl ResolvedConfig {
    /// Resolve from already-loaded layers (lowest to highest precedence).
    #[must_use]
    pub fn from_layers(layers: &[(ConfigSource, ConfigLayer)]) -> Self {
        let mut merged = ConfigLayer::default();
        let mut sources = BTreeMap::new();
        for (source, layer) in layers {
            for key in layer.values.keys() {
                sources.insert(key.clone(), *source);
            }
            merged.merge_from(layer);
        }

        let path_or = |key: &str, default: &str| {
            merged
                .get(key)
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
                .map_or_else(|| PathBuf::from(default), PathBuf::from)
        };

        let mut factors = FactorSet::new();
        for factor in Factor::ALL {
            if let Some(labels) = merged.get(factor.as_str()) {
                factors.set(factor, split_labels(labels));
            }
        }

        let text = |key: &str| {
            merged
                .get(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let defaults = AxisNames::default();
        let axes = AxisNames {
            rows: text("rows").unwrap_or(defaults.rows),
            cols: text("cols").unwrap_or(defaults.cols),
            figs: text("figs"),
            layers: text("layers"),
        };

        Self {
            options: PlotOptions::resolve(&merged),
            factors,
            axes,
            data_dir: path_or("data-dir", DEFAULT_DATA_DIR),
            cache_path: path_or("cache", DEFAULT_CACHE_FILENAME),
            out_dir: path_or("out-dir", DEFAULT_OUT_DIR),
            name: merged
                .get("name")
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| DEFAULT_FIGURE_NAME.to_string()),
            format: parse_or(&merged, "format", ImageFormat::Svg),
            sources,
        }
    }
}

/// Load configuration with the documented precedence order.
///
/// # Errors
///
/// Returns an error if the config file exists but cannot be read or parsed.
pub fn load_config(config_path: Option<&Path>, cli: &CliOverrides) -> Result<ResolvedConfig> {
    let file_path = config_path.map_or_else(
        || PathBuf::from(DEFAULT_CONFIG_FILENAME),
        Path::to_path_buf,
    );
    let file_layer = ConfigLayer::from_yaml(&file_path)?;

    Ok(ResolvedConfig::from_layers(&[
        (ConfigSource::File, file_layer),
        (ConfigSource::Env, ConfigLayer::from_env()),
        (ConfigSource::Cli, cli.as_layer()),
    ]))
}

fn normalize_key(key: &str) -> String {
    key.trim().to_lowercase().replace('_', "-")
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "y" | "on" => Some(true),
        "0" | "false" | "no" | "n" | "off" => Some(false),
        _ => None,
    }
}

fn parse_or<T: FromStr>(layer: &ConfigLayer, key: &str, default: T) -> T {
    match layer.get(key).map(|v| v.trim()) {
        None | Some("") => default,
        Some(value) => value.parse().unwrap_or_else(|_| {
            warn!(key, value, "Ignoring unparseable option, using default");
            default
        }),
    }
}

fn bool_or(layer: &ConfigLayer, key: &str, default: bool) -> bool {
    match layer.get(key).map(|v| v.trim()) {
        None | Some("") => default,
        Some(value) => parse_bool(value).unwrap_or_else(|| {
            warn!(key, value, "Ignoring unparseable flag, using default");
            default
        }),
    }
}

/// Lower and upper band quantiles inside (0, 1) on either side of 0.5.
fn valid_band([lo, hi]: [f64; 2]) -> bool {
    lo > 0.0 && hi < 1.0 && lo < hi && lo <= 0.5 && hi >= 0.5
}

fn positive_or(value: f64, default: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        default
    }
}

/// Parse `"a,b"` (also `"[a, b]"` as flattened from YAML sequences).
fn parse_pair(value: &str) -> Option<[f64; 2]> {
    let trimmed = value.trim().trim_start_matches('[').trim_end_matches(']');
    let mut parts = trimmed.split(',').map(str::trim);
    let lo = parts.next()?.parse::<f64>().ok()?;
    let hi = parts.next()?.parse::<f64>().ok()?;
    if parts.next().is_some() || !lo.is_finite() || !hi.is_finite() {
        return None;
    }
    Some([lo, hi])
}

fn pair_from_layer(layer: &ConfigLayer, key: &str) -> Option<[f64; 2]> {
    let value = layer.get(key)?;
    if value.trim().is_empty() {
        return None;
    }
    let pair = parse_pair(value);
    if pair.is_none() {
        warn!(key, value = %value, "Ignoring unparseable pair, using default");
    }
    pair
}

fn flatten_yaml(value: &serde_yaml::Value, prefix: &str, out: &mut BTreeMap<String, String>) {
    match value {
        serde_yaml::Value::Mapping(map) => {
            for (key, value) in map {
                let Some(key_str) = key.as_str() else {
                    continue;
                };
                let next_prefix = if prefix.is_empty() {
                    key_str.to_string()
                } else {
                    format!("{prefix}.{key_str}")
                };
                flatten_yaml(value, &next_prefix, out);
            }
        }
        serde_yaml::Value::Sequence(values) => {
            let joined = values
                .iter()
                .filter_map(yaml_scalar_to_string)
                .collect::<Vec<_>>()
                .join(",");
            out.insert(prefix.to_string(), joined);
        }
        _ => {
            if let Some(value) = yaml_scalar_to_string(value) {
                out.insert(prefix.to_string(), value);
            }
        }
    }
}

fn yaml_scalar_to_string(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::Bool(v) => Some(v.to_string()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Null
        | serde_yaml::Value::Sequence(_)
        | serde_yaml::Value::Mapping(_) => None,
        serde_yaml::Value::Tagged(tagged) => yaml_scalar_to_string(&tagged.value),
    }
}
