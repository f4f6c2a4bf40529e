//! End-to-end grid behaviour with stub and built-in models.

use booking_forecast::core::{DailySeries, Forecast, SeriesKey, SplitSeries};
use booking_forecast::error::{ForecastError, Result};
use booking_forecast::grid::{BestConfig, CombinationGrid, Evaluator, EvaluatorConfig, Score, Selection};
use booking_forecast::models::{BoxedForecaster, Forecaster, ModelRegistry, ModelSpec};
use booking_forecast::seasonality::{SeasonalRegistry, SeasonalSeries};
use booking_forecast::store::SeriesStore;
use chrono::NaiveDate;

const HORIZON: usize = 30;

/// Weekly pattern plus a 13-day ripple no seasonal period lines up with.
fn level(base: f64, i: usize) -> f64 {
    let weekend = if i % 7 >= 5 { 6.0 } else { 0.0 };
    base + (i % 7) as f64 + weekend + 0.25 * ((i * 5 + 3) % 13) as f64
}

/// Knows the generating formula, so it reproduces the held-out window.
struct Perfect {
    base: f64,
    trained: usize,
}

impl Forecaster for Perfect {
    fn fit(&mut self, series: &SeasonalSeries) -> Result<()> {
        self.base = series.values()[0] - level(0.0, 0);
        self.trained = series.len();
        Ok(())
    }

    fn predict(&self, horizon: usize) -> Result<Forecast> {
        Ok(Forecast::from_values(
            (self.trained..self.trained + horizon)
                .map(|i| level(self.base, i))
                .collect(),
        ))
    }

    fn fitted_values(&self) -> Option<&[f64]> {
        None
    }

    fn name(&self) -> &str {
        "Perfect"
    }
}

fn perfect() -> ModelSpec {
    ModelSpec::from_factory("perfect", || {
        Box::new(Perfect {
            base: 0.0,
            trained: 0,
        })
    })
}

fn failing() -> ModelSpec {
    ModelSpec::new("fails", |_| {
        Err::<BoxedForecaster, _>(ForecastError::ComputationError("always fails".to_string()))
    })
}

fn store(days: usize) -> SeriesStore {
    let start = NaiveDate::from_ymd_opt(2016, 3, 1).unwrap();
    let series = [("City Hotel", "Online TA", 40.0), ("Resort Hotel", "Direct", 12.0)]
        .iter()
        .map(|&(hotel, segment, base)| {
            let values = (0..days).map(|i| level(base, i)).collect();
            DailySeries::new(SeriesKey::new(hotel, segment), start, values).unwrap()
        })
        .collect();
    SeriesStore::from_series(series).unwrap()
}

fn models(specs: Vec<ModelSpec>) -> ModelRegistry {
    let mut registry = ModelRegistry::new();
    for spec in specs {
        registry.register(spec).unwrap();
    }
    registry
}

fn run(splits: &[SplitSeries], seasonal: &SeasonalRegistry, models: &ModelRegistry) -> Selection {
    run_with(splits, seasonal, models, EvaluatorConfig::default())
}

fn run_with(
    splits: &[SplitSeries],
    seasonal: &SeasonalRegistry,
    models: &ModelRegistry,
    config: EvaluatorConfig,
) -> Selection {
    let grid = CombinationGrid::new(splits, seasonal, models);
    let mut results = Evaluator::new(config).evaluate(&grid).unwrap();
    assert_eq!(results.len(), grid.len());
    Selection::select(&mut results, splits)
}

#[test]
fn perfect_model_beats_every_standard_combination() {
    let splits = store(150).split_all(HORIZON).unwrap();
    let seasonal = SeasonalRegistry::standard();
    let mut registry = models(vec![perfect()]);
    for spec in ModelRegistry::standard().iter() {
        registry.register(ModelSpec::clone(spec)).unwrap();
    }

    let selection = run(&splits, &seasonal, &registry);

    assert_eq!(selection.best().len(), 2);
    for best in selection.best() {
        let winner = best.winner().unwrap();
        assert_eq!(winner.model, "perfect");
        assert_eq!(winner.seasonal, "weekly");
        assert_eq!(winner.error, 0.0);
        assert_eq!(winner.forecast.primary(), winner.actuals.as_slice());

        let ranked = selection.ranked(best.key()).unwrap();
        assert_eq!(ranked.len(), 4 * 5);
        let (perfect, real): (Vec<_>, Vec<_>) =
            ranked.iter().partition(|entry| entry.model == "perfect");
        assert_eq!(perfect.len(), 4);
        assert!(perfect.iter().all(|entry| entry.score.error() == Some(0.0)));
        assert!(ranked[..4].iter().all(|entry| entry.model == "perfect"));
        assert!(real.iter().any(|entry| entry.score.is_available()));
        for entry in real {
            match entry.score.error() {
                Some(error) => assert!(error > 0.0, "{} x {} scored 0", entry.model, entry.seasonal),
                None => assert!(!entry.score.is_available()),
            }
        }
    }
}

#[test]
fn failing_model_is_ranked_last() {
    let splits = store(120).split_all(HORIZON).unwrap();
    let seasonal = SeasonalRegistry::standard().select(&["weekly"]).unwrap();
    let holt_winter = ModelRegistry::standard().get("holt_winter").cloned().unwrap();
    let models = models(vec![failing(), holt_winter]);

    let selection = run(&splits, &seasonal, &models);

    let key = SeriesKey::new("City Hotel", "Online TA");
    assert_eq!(selection.get(&key).unwrap().winner().unwrap().model, "holt_winter");
    let ranked = selection.ranked(&key).unwrap();
    assert_eq!(ranked.len(), 2);
    assert_eq!(ranked[1].model, "fails");
    assert!(matches!(&ranked[1].score, Score::Unavailable { reason } if reason.contains("always fails")));
}

#[test]
fn series_with_only_failures_is_reported() {
    let splits = store(60).split_all(HORIZON).unwrap();
    let seasonal = SeasonalRegistry::standard();
    let models = models(vec![failing()]);

    let selection = run(&splits, &seasonal, &models);

    assert_eq!(selection.best().len(), 2);
    assert_eq!(selection.no_viable_count(), 2);
    for best in selection.best() {
        match best {
            BestConfig::NoViableModel { failures, .. } => assert_eq!(failures.len(), 4),
            BestConfig::Found(winner) => panic!("unexpected winner {winner:?}"),
        }
    }
}

#[test]
fn annual_transform_on_short_history_is_unavailable_not_fatal() {
    let splits = store(120).split_all(HORIZON).unwrap();
    let seasonal = SeasonalRegistry::standard().select(&["annual", "weekly"]).unwrap();
    let models = ModelRegistry::standard().select(&["holt_winter"]).unwrap();

    let selection = run(&splits, &seasonal, &models);

    for best in selection.best() {
        let ranked = selection.ranked(best.key()).unwrap();
        assert_eq!(best.winner().unwrap().seasonal, "weekly");
        assert_eq!(ranked[1].seasonal, "annual");
        assert!(!ranked[1].score.is_available());
    }
}

#[test]
fn selection_is_deterministic() {
    let splits = store(112).split_all(HORIZON).unwrap();
    let seasonal = SeasonalRegistry::standard().select(&["weekly", "weekly_monthly"]).unwrap();
    let models = ModelRegistry::standard();

    let first = run(&splits, &seasonal, &models);
    let second = run_with(
        &splits,
        &seasonal,
        &models,
        EvaluatorConfig {
            threads: Some(2),
            ..EvaluatorConfig::default()
        },
    );

    for (a, b) in first.best().iter().zip(second.best()) {
        let (a, b) = (a.winner().unwrap(), b.winner().unwrap());
        assert_eq!((a.seasonal, a.model, a.ordinal), (b.seasonal, b.model, b.ordinal));
        assert_eq!(a.error.to_bits(), b.error.to_bits());
        assert_eq!(a.forecast, b.forecast);
        assert_eq!(
            first.ranked(&a.key).unwrap(),
            second.ranked(&b.key).unwrap()
        );
    }
}

#[test]
fn regenerate_matches_scored_forecast() {
    let splits = store(112).split_all(HORIZON).unwrap();
    let seasonal = SeasonalRegistry::standard().select(&["weekly"]).unwrap();
    let models = ModelRegistry::standard().select(&["stl_ets"]).unwrap();

    let selection = run(&splits, &seasonal, &models);
    let best = &selection.best()[0];
    assert_eq!(&best.regenerate(HORIZON).unwrap(), &best.winner().unwrap().forecast);
}
