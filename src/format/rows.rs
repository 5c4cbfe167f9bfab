//! Flat row view of a summary table for tabular output.

use crate::model::{SummaryStat, SummaryTable};
use serde::Serialize;

/// One (problem, subproblem, algorithm) line of a report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRow {
    pub problem: String,
    pub subproblem: String,
    pub algorithm: String,
    pub runs: usize,
    /// Final tick reached by any run.
    pub final_tick: Option<f64>,
    pub final_median: Option<f64>,
    pub final_lower: Option<f64>,
    pub final_upper: Option<f64>,
    pub median_ci: Option<[f64; 2]>,
    pub solved_fraction: f64,
    pub overhead_fraction: f64,
    pub alg_time_per_eval: f64,
    pub overhead_skipped: usize,
}

impl SummaryRow {
    #[must_use]
    pub fn new(problem: &str, subproblem: &str, algorithm: &str, stat: &SummaryStat) -> Self {
        let band = stat.final_band();
        Self {
            problem: problem.to_string(),
            subproblem: subproblem.to_string(),
            algorithm: algorithm.to_string(),
            runs: stat.n_runs,
            final_tick: stat.ticks.last().copied(),
            final_median: stat.final_median(),
            final_lower: band.map(|b| b.0),
            final_upper: band.map(|b| b.1),
            median_ci: stat.final_median_ci,
            solved_fraction: stat.solved_fraction,
            overhead_fraction: stat.overhead.fraction,
            alg_time_per_eval: stat.overhead.per_eval,
            overhead_skipped: stat.overhead.skipped_runs,
        }
    }
}

/// Flatten a summary table in key order.
#[must_use]
pub fn summary_rows(table: &SummaryTable) -> Vec<SummaryRow> {
    table
        .iter()
        .flat_map(|(problem, subs)| {
            subs.iter().flat_map(move |(subproblem, algs)| {
                algs.iter()
                    .map(move |(algorithm, stat)| SummaryRow::new(problem, subproblem, algorithm, stat))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_follow_key_order() {
        let mut table = SummaryTable::new();
        let stat = SummaryStat {
            ticks: vec![10.0],
            median: vec![0.5],
            lower: vec![0.25],
            upper: vec![0.75],
            n_runs: 4,
            ..SummaryStat::default()
        };
        for (p, s, a) in [("b", "S1", "x"), ("a", "S2", "y"), ("a", "S1", "z")] {
            table
                .entry(p.to_string())
                .or_default()
                .entry(s.to_string())
                .or_default()
                .insert(a.to_string(), stat.clone());
        }

        let rows = summary_rows(&table);
        let keys: Vec<(&str, &str)> = rows
            .iter()
            .map(|r| (r.problem.as_str(), r.subproblem.as_str()))
            .collect();
        assert_eq!(keys, vec![("a", "S1"), ("a", "S2"), ("b", "S1")]);
        assert_eq!(rows[0].final_lower, Some(0.25));
        assert_eq!(rows[0].runs, 4);
    }
}
