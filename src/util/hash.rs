//! Content hashing for cache validation.
//!
//! Uses SHA256 over stable ordered fields with null separators. Floats are
//! hashed by bit pattern so a fingerprint only matches exact inputs.

use sha2::{Digest, Sha256};

use crate::config::PlotOptions;
use crate::model::RunHistory;

struct FieldHasher(Sha256);

impl FieldHasher {
    fn new() -> Self {
        Self(Sha256::new())
    }

    fn str(&mut self, value: &str) {
        if value.contains('\0') {
            self.0.update(value.replace('\0', " ").as_bytes());
        } else {
            self.0.update(value.as_bytes());
        }
        self.0.update(b"\x00");
    }

    fn f64(&mut self, value: f64) {
        self.0.update(value.to_bits().to_le_bytes());
        self.0.update(b"\x00");
    }

    fn series(&mut self, values: &[f64]) {
        self.str(&values.len().to_string());
        for v in values {
            self.0.update(v.to_bits().to_le_bytes());
        }
        self.0.update(b"\x00");
    }

    fn finish(self) -> String {
        format!("{:x}", self.0.finalize())
    }
}

/// Hash the options that change aggregated numbers.
///
/// Fields included (stable order):
/// - error metric, best-of, zero floor, solve threshold
/// - bootstrap samples and seed, band quantiles, absolute mode
///
/// Drawing-only options (plot type, limits, layout, annotations) are excluded.
#[must_use]
pub fn options_fingerprint(options: &PlotOptions) -> String {
    let mut h = FieldHasher::new();
    h.str(options.error_metric.as_str());
    h.str(&options.best_of.to_string());
    h.f64(options.zero_floor);
    h.f64(options.solve_threshold);
    h.str(&options.samples.to_string());
    h.str(&options.seed.to_string());
    h.f64(options.quantiles[0]);
    h.f64(options.quantiles[1]);
    h.str(if options.absolute { "true" } else { "false" });
    h.finish()
}

/// Hash a group of run histories (order-sensitive).
#[must_use]
pub fn histories_fingerprint(runs: &[RunHistory]) -> String {
    let mut h = FieldHasher::new();
    h.str(&runs.len().to_string());
    for run in runs {
        h.series(&run.ticks);
        h.series(&run.lnz);
        h.series(&run.lnz_var);
        h.series(&run.gskl);
        h.series(&run.elapsed_time);
        h.series(&run.func_time);
        h.f64(run.lnz_true);
        h.f64(run.budget.unwrap_or(f64::INFINITY));
        h.f64(run.speed);
    }
    h.finish()
}
