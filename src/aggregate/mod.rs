//! Per-panel aggregation of run histories into summary statistics.
//!
//! For every layer of every panel the aggregator looks up the results
//! cache, falls back to the run collector, and reduces the runs to a
//! [`SummaryStat`]: median and quantile band of the error at each tick,
//! solved fraction, a bootstrap interval of the final median and overhead
//! statistics.

use crate::cache::{CacheEntry, ResultCache};
use crate::collect::RunCollector;
use crate::config::PlotOptions;
use crate::error::{PlotError, Result};
use crate::layout::{LayerPlan, PlotPlan};
use crate::model::{ErrorMetric, OverheadStats, RunHistory, Selection, SummaryStat, SummaryTable};
use crate::stats;
use crate::util::progress::JobProgress;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// A run's scored series: finite values only, paired with their ticks.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunCurve {
    pub ticks: Vec<f64>,
    pub values: Vec<f64>,
}

impl RunCurve {
    #[must_use]
    pub fn last(&self) -> Option<f64> {
        self.values.last().copied()
    }
}

/// Number of leading ticks within the run's valid budget.
#[must_use]
pub fn budget_len(run: &RunHistory) -> usize {
    run.budget.map_or(run.ticks.len(), |budget| {
        run.ticks.iter().take_while(|t| **t <= budget).count()
    })
}

fn metric_value(run: &RunHistory, metric: ErrorMetric, i: usize) -> Option<f64> {
    let lnz = || run.lnz.get(i).copied();
    match metric {
        ErrorMetric::Abs => Some((lnz()? - run.lnz_true).abs()),
        ErrorMetric::ZScore => {
            Some((lnz()? - run.lnz_true).abs() / run.lnz_var.get(i).copied()?.sqrt())
        }
        ErrorMetric::GsKl => run.gskl.get(i).copied(),
    }
}

/// Error series of one run under `metric`, floored at `zero_floor`.
#[must_use]
pub fn error_curve(run: &RunHistory, metric: ErrorMetric, zero_floor: f64) -> RunCurve {
    let mut curve = RunCurve::default();
    for i in 0..budget_len(run) {
        let tick = run.ticks[i];
        match metric_value(run, metric, i) {
            Some(v) if v.is_finite() && tick.is_finite() => {
                curve.ticks.push(tick);
                curve.values.push(v.max(zero_floor));
            }
            _ => {}
        }
    }
    curve
}

/// Raw log-evidence estimates of one run (absolute mode, no floor).
#[must_use]
pub fn estimate_curve(run: &RunHistory) -> RunCurve {
    let mut curve = RunCurve::default();
    for i in 0..budget_len(run) {
        let tick = run.ticks[i];
        match run.lnz.get(i) {
            Some(v) if v.is_finite() && tick.is_finite() => {
                curve.ticks.push(tick);
                curve.values.push(*v);
            }
            _ => {}
        }
    }
    curve
}

/// Indexes kept by best-of-N: runs are split into consecutive groups of `n`
/// and the run with the lowest final error of each group survives. Runs
/// without a final error lose to any run that has one.
#[must_use]
pub fn best_of_indices(final_errors: &[Option<f64>], n: usize) -> Vec<usize> {
    if n <= 1 {
        return (0..final_errors.len()).collect();
    }
    final_errors
        .chunks(n)
        .enumerate()
        .map(|(group, chunk)| {
            let best = chunk
                .iter()
                .enumerate()
                .min_by(|(_, a), (_, b)| {
                    a.unwrap_or(f64::INFINITY)
                        .total_cmp(&b.unwrap_or(f64::INFINITY))
                })
                .map_or(0, |(i, _)| i);
            group * n + best
        })
        .collect()
}

/// Final timing of one run, speed-normalized.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverheadSample {
    pub alg_time: f64,
    pub fun_time: f64,
    pub final_tick: f64,
}

/// Per-tick overhead `(elapsed - func_time) / speed` of one run, reduced to
/// its final sample. `Ok(None)` when the run recorded no timing at all.
///
/// # Errors
///
/// Returns `MalformedOverhead` for length mismatches, non-finite values,
/// a non-positive speed or negative overhead.
pub fn run_overhead(run: &RunHistory) -> Result<Option<OverheadSample>> {
    if run.elapsed_time.is_empty() && run.func_time.is_empty() {
        return Ok(None);
    }
    let n = budget_len(run);
    if n == 0 {
        return Ok(None);
    }
    if !run.speed.is_finite() || run.speed <= 0.0 {
        return Err(PlotError::overhead(format!("invalid speed {}", run.speed)));
    }
    if run.elapsed_time.len() < n || run.func_time.len() < n {
        return Err(PlotError::overhead(format!(
            "timing series cover {}/{} of {n} ticks",
            run.elapsed_time.len(),
            run.func_time.len()
        )));
    }

    let mut last = 0.0;
    for (i, (elapsed, func)) in run.elapsed_time[..n]
        .iter()
        .zip(&run.func_time[..n])
        .enumerate()
    {
        let overhead = (elapsed - func) / run.speed;
        if !overhead.is_finite() {
            return Err(PlotError::overhead(format!("non-finite timing at tick {i}")));
        }
        if overhead < 0.0 {
            return Err(PlotError::overhead(format!(
                "function time exceeds elapsed time at tick {i}"
            )));
        }
        last = overhead;
    }

    Ok(Some(OverheadSample {
        alg_time: last,
        fun_time: run.func_time[n - 1] / run.speed,
        final_tick: run.ticks[n - 1],
    }))
}

/// Combine per-run overhead samples.
#[must_use]
pub fn overhead_stats(samples: &[OverheadSample], skipped_runs: usize) -> OverheadStats {
    let alg: Vec<f64> = samples.iter().map(|s| s.alg_time).collect();
    let fun: Vec<f64> = samples.iter().map(|s| s.fun_time).collect();
    let ticks: Vec<f64> = samples.iter().map(|s| s.final_tick).collect();

    let alg_time = stats::mean(&alg).unwrap_or(0.0);
    let fun_time = stats::mean(&fun).unwrap_or(0.0);
    let total = alg_time + fun_time;
    let mean_tick = stats::mean(&ticks).unwrap_or(0.0);

    OverheadStats {
        alg_time,
        fun_time,
        fraction: if total > 0.0 { alg_time / total } else { 0.0 },
        per_eval: if mean_tick > 0.0 { alg_time / mean_tick } else { 0.0 },
        skipped_runs,
    }
}

fn check_lnz_true(runs: &[RunHistory]) -> f64 {
    let first = runs[0].lnz_true;
    let tol = 1e-9 * first.abs().max(1.0);
    if let Some(other) = runs.iter().find(|r| (r.lnz_true - first).abs() > tol) {
        warn!(
            expected = first,
            found = other.lnz_true,
            "True log evidence differs between runs; using the first"
        );
    }
    first
}

/// Reduce a group of runs to summary statistics.
///
/// Returns `None` when no run contributes a single finite value.
#[must_use]
pub fn summarize(runs: &[RunHistory], options: &PlotOptions) -> Option<SummaryStat> {
    if runs.is_empty() {
        return None;
    }
    let lnz_true = check_lnz_true(runs);

    let scores: Vec<RunCurve> = runs
        .iter()
        .map(|r| error_curve(r, options.error_metric, options.zero_floor))
        .collect();
    let finals: Vec<Option<f64>> = scores.iter().map(RunCurve::last).collect();
    let kept = best_of_indices(&finals, options.best_of);

    let curves: Vec<RunCurve> = kept
        .iter()
        .map(|&i| {
            if options.absolute {
                estimate_curve(&runs[i])
            } else {
                scores[i].clone()
            }
        })
        .collect();

    let mut points: Vec<(f64, f64)> = curves
        .iter()
        .flat_map(|c| c.ticks.iter().copied().zip(c.values.iter().copied()))
        .collect();
    if points.is_empty() {
        debug!(runs = runs.len(), "No finite values in group");
        return None;
    }
    points.sort_by(|a, b| a.0.total_cmp(&b.0));

    let [q_lo, q_hi] = options.quantiles;
    let mut stat = SummaryStat {
        lnz_true,
        n_runs: kept.len(),
        ..SummaryStat::default()
    };
    for group in points.chunk_by(|a, b| a.0 == b.0) {
        let sorted = stats::sorted_finite(&group.iter().map(|p| p.1).collect::<Vec<_>>());
        let (Some(median), Some(lower), Some(upper)) = (
            stats::quantile_sorted(&sorted, 0.5),
            stats::quantile_sorted(&sorted, q_lo),
            stats::quantile_sorted(&sorted, q_hi),
        ) else {
            continue;
        };
        stat.ticks.push(group[0].0);
        stat.median.push(median);
        stat.lower.push(lower);
        stat.upper.push(upper);
        stat.counts.push(sorted.len());
    }

    let solved = kept
        .iter()
        .filter(|&&i| finals[i].is_some_and(|e| e <= options.solve_threshold))
        .count();
    stat.solved_fraction = solved as f64 / kept.len() as f64;

    let final_values: Vec<f64> = curves.iter().filter_map(RunCurve::last).collect();
    stat.final_median_ci = stats::bootstrap_median_ci(&final_values, options.samples, options.seed);

    let mut samples = Vec::with_capacity(kept.len());
    let mut skipped = 0;
    for &i in &kept {
        match run_overhead(&runs[i]) {
            Ok(Some(sample)) => samples.push(sample),
            Ok(None) => {}
            Err(e) => {
                warn!(run = i, error = %e, "Skipping run overhead");
                skipped += 1;
            }
        }
    }
    stat.overhead = overhead_stats(&samples, skipped);

    Some(stat)
}

/// Where a layer's statistics came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatSource {
    /// Cached summary reused as-is.
    Cache,
    /// Cached histories re-aggregated under new options.
    Recomputed,
    /// Freshly collected from run files.
    Collected,
}

/// Counters for one aggregation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AggregationReport {
    pub jobs: usize,
    pub cache_hits: usize,
    pub recomputed: usize,
    pub collected: usize,
    /// Layers with no usable runs.
    pub empty: usize,
}

/// Result of aggregating a whole plot plan.
#[derive(Debug, Clone, Default)]
pub struct Aggregation {
    /// Statistics per label tuple (layers with no usable runs are absent).
    pub by_selection: BTreeMap<Selection, SummaryStat>,
    /// problem -> subproblem -> algorithm view of the same statistics.
    pub table: SummaryTable,
    pub report: AggregationReport,
}

impl Aggregation {
    /// Statistics drawn for `layer`.
    #[must_use]
    pub fn stat_for(&self, layer: &LayerPlan) -> Option<&SummaryStat> {
        self.by_selection.get(&layer.selection)
    }
}

/// Aggregate every (panel, layer) of `plan`.
///
/// The cache is consulted first and updated with anything collected or
/// recomputed; persisting it is up to the caller.
///
/// # Errors
///
/// Propagates collector failures that affect the whole collection.
pub fn aggregate<C>(
    plan: &PlotPlan,
    collector: &C,
    cache: &mut ResultCache,
    options: &PlotOptions,
) -> Result<Aggregation>
where
    C: RunCollector + ?Sized,
{
    let fingerprint = options.fingerprint();
    let mut out = Aggregation::default();
    out.report.jobs = plan.job_count();
    let progress = JobProgress::new(out.report.jobs, "Aggregating");

    for figure in &plan.figures {
        for panel in &figure.panels {
            for layer in &panel.layers {
                progress.advance(&layer.key);

                let (stat, source) = match cache.get(&layer.key) {
                    Some(entry) if entry.selection == layer.selection => {
                        if let Some(summary) = entry.summary_for(&fingerprint) {
                            (Some(summary.clone()), StatSource::Cache)
                        } else {
                            let stat = summarize(&entry.histories, options);
                            let refreshed = CacheEntry::new(
                                entry.selection.clone(),
                                entry.histories.clone(),
                                stat.clone(),
                                fingerprint.clone(),
                            );
                            cache.insert(layer.key.clone(), refreshed);
                            (stat, StatSource::Recomputed)
                        }
                    }
                    _ => {
                        let runs = collector.collect(&layer.selection)?;
                        let stat = summarize(&runs, options);
                        if !runs.is_empty() {
                            cache.insert(
                                layer.key.clone(),
                                CacheEntry::new(
                                    layer.selection.clone(),
                                    runs,
                                    stat.clone(),
                                    fingerprint.clone(),
                                ),
                            );
                        }
                        (stat, StatSource::Collected)
                    }
                };

                match source {
                    StatSource::Cache => out.report.cache_hits += 1,
                    StatSource::Recomputed => out.report.recomputed += 1,
                    StatSource::Collected => out.report.collected += 1,
                }

                let Some(stat) = stat else {
                    debug!(key = %layer.key, selection = %layer.selection, "No runs; skipping layer");
                    out.report.empty += 1;
                    continue;
                };

                let sel = &layer.selection;
                out.table
                    .entry(sel.prob.clone())
                    .or_default()
                    .entry(sel.subprob_key())
                    .or_default()
                    .insert(sel.alg_key(), stat.clone());
                out.by_selection.insert(layer.selection.clone(), stat);
            }
        }
    }
    progress.finish();

    info!(
        jobs = out.report.jobs,
        cached = out.report.cache_hits,
        recomputed = out.report.recomputed,
        collected = out.report.collected,
        empty = out.report.empty,
        "Aggregation complete"
    );
    Ok(out)
}
