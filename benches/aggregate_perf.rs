// Aggregation performance benchmarks.
//
// Run with: cargo bench
//
// | Operation               | Target  | Description                         |
// |-------------------------|---------|-------------------------------------|
// | summarize (20 runs)     | < 1ms   | One layer, 50 ticks per run         |
// | summarize (200 runs)    | < 10ms  | One layer, 50 ticks per run         |
// | aggregate (cold, 4x4x4) | < 50ms  | 64 layers collected in memory       |
// | aggregate (warm, 4x4x4) | < 5ms   | Same plan served from the cache     |

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use infbench_plot::aggregate::{aggregate, summarize};
use infbench_plot::cache::ResultCache;
use infbench_plot::collect::StaticCollector;
use infbench_plot::config::PlotOptions;
use infbench_plot::layout::{Ordering, expand};
use infbench_plot::model::{Factor, FactorSet, RunHistory};
use std::hint::black_box;

/// Deterministic run whose error decays with the tick.
fn synthetic_run(seed: usize, ticks: usize) -> RunHistory {
    let ticks_v: Vec<f64> = (1..=ticks).map(|t| (t * 10) as f64).collect();
    let lnz = ticks_v
        .iter()
        .map(|t| {
            let jitter = ((seed * 7919 + *t as usize) % 97) as f64 / 97.0;
            (1.0 + jitter) * 100.0 / t
        })
        .collect();
    let elapsed: Vec<f64> = ticks_v.iter().map(|t| t * 0.02).collect();
    let func: Vec<f64> = ticks_v.iter().map(|t| t * 0.01).collect();
    RunHistory {
        ticks: ticks_v,
        lnz,
        lnz_var: vec![],
        gskl: vec![],
        elapsed_time: elapsed,
        func_time: func,
        lnz_true: 0.0,
        budget: None,
        speed: 1.0,
    }
}

fn labels(prefix: &str, n: usize) -> Vec<String> {
    (0..n).map(|i| format!("{prefix}{i}")).collect()
}

fn bench_summarize(c: &mut Criterion) {
    let options = PlotOptions::default();
    let mut group = c.benchmark_group("summarize");
    for n in [20usize, 200] {
        let runs: Vec<RunHistory> = (0..n).map(|i| synthetic_run(i, 50)).collect();
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), &runs, |b, runs| {
            b.iter(|| summarize(black_box(runs), &options));
        });
    }
    group.finish();
}

fn bench_aggregate(c: &mut Criterion) {
    let factors = FactorSet::new()
        .with(Factor::Prob, labels("p", 4))
        .with(Factor::SubProb, labels("s", 4))
        .with(Factor::Alg, labels("a", 4));
    let plan = expand(&factors, &Ordering::default(), false).expect("plan");
    let options = PlotOptions {
        samples: 200,
        ..PlotOptions::default()
    };

    let mut collector = StaticCollector::new();
    for (i, layer) in plan
        .figures
        .iter()
        .flat_map(|f| &f.panels)
        .flat_map(|p| &p.layers)
        .enumerate()
    {
        let runs = (0..10).map(|r| synthetic_run(i * 10 + r, 50)).collect();
        collector.insert(layer.selection.clone(), runs);
    }

    let mut group = c.benchmark_group("aggregate");
    group.throughput(Throughput::Elements(plan.job_count() as u64));
    group.bench_function("cold", |b| {
        b.iter(|| {
            let mut cache = ResultCache::new();
            aggregate(&plan, &collector, &mut cache, &options).expect("aggregate")
        });
    });

    let mut warm = ResultCache::new();
    aggregate(&plan, &collector, &mut warm, &options).expect("warm up");
    group.bench_function("warm", |b| {
        b.iter(|| aggregate(&plan, &collector, &mut warm, &options).expect("aggregate"));
    });
    group.finish();
}

criterion_group!(benches, bench_summarize, bench_aggregate);
criterion_main!(benches);
