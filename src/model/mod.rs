//! Core data types for `infbench_plot`.
//!
//! This module defines the fundamental types used throughout the application:
//! - `Factor` - The six categorical benchmark dimensions
//! - `Selection` - One label per factor (identifies a group of runs)
//! - `RunHistory` - Time series recorded by one independent run
//! - `ErrorMetric` / `PlotType` - How runs are scored and drawn
//! - `SummaryStat` / `SummaryTable` - Aggregated statistics

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::PlotError;

/// One of the six categorical dimensions of a benchmark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Factor {
    ProbSet,
    Prob,
    SubProb,
    Noise,
    Alg,
    AlgSet,
}

impl Factor {
    /// All factors in canonical order.
    pub const ALL: [Self; 6] = [
        Self::ProbSet,
        Self::Prob,
        Self::SubProb,
        Self::Noise,
        Self::Alg,
        Self::AlgSet,
    ];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ProbSet => "probset",
            Self::Prob => "prob",
            Self::SubProb => "subprob",
            Self::Noise => "noise",
            Self::Alg => "alg",
            Self::AlgSet => "algset",
        }
    }

    /// Position in canonical order.
    #[must_use]
    pub const fn index(&self) -> usize {
        match self {
            Self::ProbSet => 0,
            Self::Prob => 1,
            Self::SubProb => 2,
            Self::Noise => 3,
            Self::Alg => 4,
            Self::AlgSet => 5,
        }
    }
}

impl fmt::Display for Factor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Factor {
    type Err = PlotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['_', '-'], "").as_str() {
            "probset" | "problemset" => Ok(Self::ProbSet),
            "prob" | "problem" => Ok(Self::Prob),
            "subprob" | "subproblem" | "dim" => Ok(Self::SubProb),
            "noise" => Ok(Self::Noise),
            "alg" | "algorithm" => Ok(Self::Alg),
            "algset" | "setting" | "algsetting" => Ok(Self::AlgSet),
            _ => Err(PlotError::UnknownFactor {
                name: s.to_string(),
            }),
        }
    }
}

/// Label lists for all six factors.
///
/// An empty label is a hole: it keeps its index but yields no panel or layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactorSet {
    labels: [Vec<String>; 6],
}

impl FactorSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter.
    #[must_use]
    pub fn with(mut self, factor: Factor, labels: Vec<String>) -> Self {
        self.set(factor, labels);
        self
    }

    pub fn set(&mut self, factor: Factor, labels: Vec<String>) {
        self.labels[factor.index()] = labels.into_iter().map(|l| l.trim().to_string()).collect();
    }

    #[must_use]
    pub fn get(&self, factor: Factor) -> &[String] {
        &self.labels[factor.index()]
    }

    /// First non-empty label of a factor, or an empty string.
    #[must_use]
    pub fn first(&self, factor: Factor) -> &str {
        self.get(factor)
            .iter()
            .find(|l| !l.is_empty())
            .map_or("", String::as_str)
    }
}

/// One label per factor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Selection {
    pub probset: String,
    pub prob: String,
    pub subprob: String,
    pub noise: String,
    pub alg: String,
    pub algset: String,
}

impl Selection {
    #[must_use]
    pub fn get(&self, factor: Factor) -> &str {
        match factor {
            Factor::ProbSet => &self.probset,
            Factor::Prob => &self.prob,
            Factor::SubProb => &self.subprob,
            Factor::Noise => &self.noise,
            Factor::Alg => &self.alg,
            Factor::AlgSet => &self.algset,
        }
    }

    pub fn set(&mut self, factor: Factor, label: &str) {
        let slot = match factor {
            Factor::ProbSet => &mut self.probset,
            Factor::Prob => &mut self.prob,
            Factor::SubProb => &mut self.subprob,
            Factor::Noise => &mut self.noise,
            Factor::Alg => &mut self.alg,
            Factor::AlgSet => &mut self.algset,
        };
        label.clone_into(slot);
    }

    /// `subprob@noise`, or just `subprob` when noise is empty.
    #[must_use]
    pub fn subprob_key(&self) -> String {
        if self.noise.is_empty() {
            self.subprob.clone()
        } else {
            format!("{}@{}", self.subprob, self.noise)
        }
    }

    /// `alg@algset`, or just `alg` when the setting is empty.
    #[must_use]
    pub fn alg_key(&self) -> String {
        if self.algset.is_empty() {
            self.alg.clone()
        } else {
            format!("{}@{}", self.alg, self.algset)
        }
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}@{}/{}/{}",
            self.probset,
            self.prob,
            self.subprob_key(),
            self.alg_key()
        )
    }
}

/// History recorded by one independent benchmark run.
///
/// All series are indexed by save tick. Non-finite entries are written as
/// JSON `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RunHistory {
    /// Function-evaluation counts at which the run state was saved.
    pub ticks: Vec<f64>,
    /// Log-evidence estimate per tick.
    #[serde(with = "nan_as_null")]
    #[schemars(with = "Vec<Option<f64>>")]
    pub lnz: Vec<f64>,
    /// Variance of the log-evidence estimate per tick.
    #[serde(default, with = "nan_as_null")]
    #[schemars(with = "Vec<Option<f64>>")]
    pub lnz_var: Vec<f64>,
    /// Gaussianized symmetric KL divergence to the true posterior per tick.
    #[serde(default, with = "nan_as_null")]
    #[schemars(with = "Vec<Option<f64>>")]
    pub gskl: Vec<f64>,
    /// Cumulative wall-clock time per tick (seconds).
    #[serde(default, with = "nan_as_null")]
    #[schemars(with = "Vec<Option<f64>>")]
    pub elapsed_time: Vec<f64>,
    /// Cumulative time spent inside the target function per tick (seconds).
    #[serde(default, with = "nan_as_null")]
    #[schemars(with = "Vec<Option<f64>>")]
    pub func_time: Vec<f64>,
    /// Known true log evidence of the problem.
    pub lnz_true: f64,
    /// Valid evaluation budget; later ticks are discarded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget: Option<f64>,
    /// Machine speed normalization factor.
    #[serde(default = "default_speed")]
    pub speed: f64,
}

const fn default_speed() -> f64 {
    1.0
}

/// On-disk container of run histories.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RunFile {
    pub runs: Vec<RunHistory>,
}

/// How a run is scored against ground truth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorMetric {
    /// |lnZ - lnZ_true|
    #[default]
    Abs,
    /// |lnZ - lnZ_true| / sqrt(var)
    ZScore,
    /// Gaussianized symmetric KL series.
    GsKl,
}

impl ErrorMetric {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Abs => "abs",
            Self::ZScore => "zscore",
            Self::GsKl => "gskl",
        }
    }

    /// Axis description for plots.
    #[must_use]
    pub const fn axis_label(&self) -> &'static str {
        match self {
            Self::Abs => "Median LML error",
            Self::ZScore => "Median LML z-score",
            Self::GsKl => "Median gsKL",
        }
    }
}

impl fmt::Display for ErrorMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ErrorMetric {
    type Err = PlotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "abs" | "ir" | "lnz" => Ok(Self::Abs),
            "zscore" | "z" => Ok(Self::ZScore),
            "gskl" | "kl" => Ok(Self::GsKl),
            other => Err(PlotError::Config(format!("unknown error metric '{other}'"))),
        }
    }
}

/// How each layer is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlotType {
    /// Median line with a shaded quantile band.
    #[default]
    Shaded,
    /// Median line only.
    Line,
}

impl PlotType {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Shaded => "shaded",
            Self::Line => "line",
        }
    }
}

impl fmt::Display for PlotType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PlotType {
    type Err = PlotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "shaded" | "errorbar" | "band" => Ok(Self::Shaded),
            "line" | "plain" => Ok(Self::Line),
            other => Err(PlotError::Config(format!("unknown plot type '{other}'"))),
        }
    }
}

/// Overhead statistics for one aggregation group.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OverheadStats {
    /// Mean algorithm (non-function) time per run, speed-normalized.
    pub alg_time: f64,
    /// Mean function time per run, speed-normalized.
    pub fun_time: f64,
    /// alg / (alg + fun); zero when both are zero.
    pub fraction: f64,
    /// Algorithm time per function evaluation.
    pub per_eval: f64,
    /// Runs whose overhead series was malformed.
    pub skipped_runs: usize,
}

/// Aggregated statistics for one (problem, subproblem, algorithm) group.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SummaryStat {
    pub ticks: Vec<f64>,
    pub median: Vec<f64>,
    pub lower: Vec<f64>,
    pub upper: Vec<f64>,
    /// Number of runs contributing at each tick.
    pub counts: Vec<usize>,
    pub lnz_true: f64,
    pub n_runs: usize,
    pub solved_fraction: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_median_ci: Option<[f64; 2]>,
    pub overhead: OverheadStats,
}

impl SummaryStat {
    /// Median at the last tick.
    #[must_use]
    pub fn final_median(&self) -> Option<f64> {
        self.median.last().copied()
    }

    /// (lower, upper) at the last tick.
    #[must_use]
    pub fn final_band(&self) -> Option<(f64, f64)> {
        Some((*self.lower.last()?, *self.upper.last()?))
    }
}

/// problem -> subproblem(+noise) -> algorithm -> stats.
pub type SummaryTable = BTreeMap<String, BTreeMap<String, BTreeMap<String, SummaryStat>>>;

/// Serialize `Vec<f64>` with non-finite values as `null`.
pub mod nan_as_null {
    use serde::{Deserialize, Deserializer, Serializer, ser::SerializeSeq};

    #[allow(clippy::ptr_arg)]
    pub fn serialize<S>(values: &Vec<f64>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut seq = serializer.serialize_seq(Some(values.len()))?;
        for v in values {
            if v.is_finite() {
                seq.serialize_element(v)?;
            } else {
                seq.serialize_element(&Option::<f64>::None)?;
            }
        }
        seq.end()
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Vec<Option<f64>> = Vec::deserialize(deserializer)?;
        Ok(raw.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect())
    }
}
