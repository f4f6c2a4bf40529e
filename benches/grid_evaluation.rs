//! Benchmarks for grid evaluation.

use booking_forecast::core::{DailySeries, SeriesKey, SplitSeries};
use booking_forecast::grid::{CombinationGrid, Evaluator, EvaluatorConfig};
use booking_forecast::models::ModelRegistry;
use booking_forecast::seasonality::SeasonalRegistry;
use chrono::NaiveDate;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

fn generate_bookings(n: usize, base: f64) -> Vec<f64> {
    (0..n)
        .map(|i| {
            let t = i as f64;
            (base
                + 0.02 * t
                + 0.3 * base * (2.0 * std::f64::consts::PI * t / 7.0).sin()
                + 0.1 * base * (2.0 * std::f64::consts::PI * t / 28.0).cos()
                + ((i * 37 % 11) as f64 - 5.0) * 0.5)
                .max(0.0)
                .round()
        })
        .collect()
}

fn splits(count: usize, days: usize) -> Vec<SplitSeries> {
    let start = NaiveDate::from_ymd_opt(2016, 1, 1).unwrap();
    (0..count)
        .map(|i| {
            DailySeries::new(
                SeriesKey::new("City Hotel", format!("Segment {i}")),
                start,
                generate_bookings(days, 20.0 + 10.0 * i as f64),
            )
            .unwrap()
            .split(30)
            .unwrap()
        })
        .collect()
}

fn bench_models(c: &mut Criterion) {
    let mut group = c.benchmark_group("single_model");
    group.sample_size(10);

    let series = splits(1, 400);
    let seasonal = SeasonalRegistry::standard().select(&["weekly"]).unwrap();
    let evaluator = Evaluator::new(EvaluatorConfig::default());

    for name in ModelRegistry::standard().names() {
        let models = ModelRegistry::standard().select(&[name]).unwrap();
        group.bench_with_input(BenchmarkId::new("weekly", name), &name, |b, _| {
            let grid = CombinationGrid::new(&series, &seasonal, &models);
            b.iter(|| evaluator.evaluate(black_box(&grid)))
        });
    }

    group.finish();
}

fn bench_grid(c: &mut Criterion) {
    let mut group = c.benchmark_group("full_grid");
    group.sample_size(10);

    let seasonal = SeasonalRegistry::standard();
    let models = ModelRegistry::standard();

    for count in [1usize, 4] {
        let series = splits(count, 800);
        group.bench_with_input(BenchmarkId::new("series", count), &count, |b, _| {
            let grid = CombinationGrid::new(&series, &seasonal, &models);
            let evaluator = Evaluator::new(EvaluatorConfig::default());
            b.iter(|| evaluator.evaluate(black_box(&grid)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_models, bench_grid);
criterion_main!(benches);
