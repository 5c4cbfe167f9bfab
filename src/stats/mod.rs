//! Order statistics used by the aggregator.
//!
//! Quantiles follow the Hazen definition: the i-th smallest of n values
//! (1-based) sits at probability (i - 0.5) / n, with linear interpolation
//! in between and clamping outside. For two values this makes the quartiles
//! equal to the two values themselves.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Sort finite values ascending, dropping NaN/inf.
#[must_use]
pub fn sorted_finite(values: &[f64]) -> Vec<f64> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    sorted.sort_by(f64::total_cmp);
    sorted
}

/// Quantile `p` (0..=1) of an ascending slice. `None` when empty.
#[must_use]
pub fn quantile_sorted(sorted: &[f64], p: f64) -> Option<f64> {
    let n = sorted.len();
    if n == 0 {
        return None;
    }
    if n == 1 {
        return Some(sorted[0]);
    }

    let pos = (n as f64).mul_add(p.clamp(0.0, 1.0), 0.5);
    if pos <= 1.0 {
        return Some(sorted[0]);
    }
    if pos >= n as f64 {
        return Some(sorted[n - 1]);
    }

    let lo = pos.floor();
    let frac = pos - lo;
    let i = lo as usize - 1;
    Some(frac.mul_add(sorted[i + 1] - sorted[i], sorted[i]))
}

/// Quantile of unsorted values (non-finite values ignored).
#[must_use]
pub fn quantile(values: &[f64], p: f64) -> Option<f64> {
    quantile_sorted(&sorted_finite(values), p)
}

/// Median of unsorted values (non-finite values ignored).
#[must_use]
pub fn median(values: &[f64]) -> Option<f64> {
    quantile(values, 0.5)
}

/// Arithmetic mean, `None` when empty.
#[must_use]
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Percentile bootstrap interval (2.5%, 97.5%) for the median.
///
/// Returns `None` when `samples == 0` or there are fewer than two values.
/// Deterministic for a given `seed`.
#[must_use]
pub fn bootstrap_median_ci(values: &[f64], samples: usize, seed: u64) -> Option<[f64; 2]> {
    let data = sorted_finite(values);
    if samples == 0 || data.len() < 2 {
        return None;
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut medians = Vec::with_capacity(samples);
    let mut resample = vec![0.0; data.len()];
    for _ in 0..samples {
        for slot in &mut resample {
            *slot = data[rng.random_range(0..data.len())];
        }
        resample.sort_by(f64::total_cmp);
        if let Some(m) = quantile_sorted(&resample, 0.5) {
            medians.push(m);
        }
    }
    medians.sort_by(f64::total_cmp);

    Some([
        quantile_sorted(&medians, 0.025)?,
        quantile_sorted(&medians, 0.975)?,
    ])
}
