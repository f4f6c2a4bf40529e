//! Fitting and scoring of grid jobs.
//!
//! Jobs share nothing mutable, so they are mapped in parallel with rayon
//! and collected back in enumeration order. A failing job never stops the
//! grid: fit errors, panics, timeouts and unusable forecasts all become
//! [`Score::Unavailable`].

use super::job::{CombinationGrid, Job};
use crate::core::{Forecast, SeriesKey};
use crate::error::{ForecastError, Result};
use crate::models::{BoxedForecaster, ModelSpec};
use crate::seasonality::SeasonalSeries;
use crate::utils::metrics::mae;
use rayon::prelude::*;
use std::any::Any;
use std::cmp::Ordering;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Outcome of one job.
#[derive(Debug, Clone, PartialEq)]
pub enum Score {
    /// Mean absolute error over the held-out window. Always finite.
    Error(f64),
    Unavailable { reason: String },
}

impl Score {
    pub fn is_available(&self) -> bool {
        matches!(self, Score::Error(_))
    }

    pub fn error(&self) -> Option<f64> {
        match self {
            Score::Error(e) => Some(*e),
            Score::Unavailable { .. } => None,
        }
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            Score::Error(_) => None,
            Score::Unavailable { reason } => Some(reason),
        }
    }

    /// Lower errors first; unavailable scores after every error.
    pub fn rank_cmp(&self, other: &Score) -> Ordering {
        match (self, other) {
            (Score::Error(a), Score::Error(b)) => a.total_cmp(b),
            (Score::Error(_), Score::Unavailable { .. }) => Ordering::Less,
            (Score::Unavailable { .. }, Score::Error(_)) => Ordering::Greater,
            (Score::Unavailable { .. }, Score::Unavailable { .. }) => Ordering::Equal,
        }
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Score::Error(e) => write!(f, "{e:.4}"),
            Score::Unavailable { reason } => write!(f, "unavailable ({reason})"),
        }
    }
}

/// Result of evaluating one job.
pub struct EvaluationResult {
    pub job: Job,
    pub key: SeriesKey,
    pub seasonal: &'static str,
    pub model: &'static str,
    pub score: Score,
    /// Forecast over the held-out window, when the job produced one.
    pub forecast: Option<Forecast>,
    /// Fitted handle. Selection keeps only the winner's.
    pub fitted: Option<BoxedForecaster>,
}

impl fmt::Debug for EvaluationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EvaluationResult")
            .field("ordinal", &self.job.ordinal)
            .field("key", &self.key)
            .field("seasonal", &self.seasonal)
            .field("model", &self.model)
            .field("score", &self.score)
            .field("fitted", &self.fitted.as_ref().map(|m| m.name().to_string()))
            .finish()
    }
}

/// Evaluation settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluatorConfig {
    /// Held-out window length every forecast must match.
    pub horizon: usize,
    /// Per-job budget for fitting and forecasting.
    pub fit_timeout: Option<Duration>,
    /// Worker threads; rayon's global pool when unset.
    pub threads: Option<usize>,
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self {
            horizon: 30,
            fit_timeout: None,
            threads: None,
        }
    }
}

/// Runs every job of a grid.
#[derive(Debug, Clone, Default)]
pub struct Evaluator {
    config: EvaluatorConfig,
}

impl Evaluator {
    pub fn new(config: EvaluatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EvaluatorConfig {
        &self.config
    }

    /// Evaluate all jobs. Results come back in grid order.
    ///
    /// Only pool construction can fail; individual jobs never do.
    pub fn evaluate(&self, grid: &CombinationGrid<'_>) -> Result<Vec<EvaluationResult>> {
        info!(jobs = grid.len(), threads = ?self.config.threads, "evaluating grid");
        let results = match self.config.threads {
            Some(threads) => rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .build()
                .map_err(|err| ForecastError::Config(format!("thread pool: {err}")))?
                .install(|| self.evaluate_all(grid)),
            None => self.evaluate_all(grid),
        };

        let unavailable = results.iter().filter(|r| !r.score.is_available()).count();
        info!(jobs = results.len(), unavailable, "grid evaluated");
        Ok(results)
    }

    fn evaluate_all(&self, grid: &CombinationGrid<'_>) -> Vec<EvaluationResult> {
        grid.jobs()
            .par_iter()
            .map(|job| self.evaluate_job(grid, *job))
            .collect()
    }

    /// Fit, forecast and score a single job.
    pub fn evaluate_job(&self, grid: &CombinationGrid<'_>, job: Job) -> EvaluationResult {
        let split = grid.split(&job);
        let seasonal = grid.seasonal_spec(&job);
        let model = grid.model_spec(&job);
        let series = seasonal.apply(split.train());

        let (score, forecast, fitted) = match self.fit_and_forecast(model, series) {
            Ok((fitted, forecast)) => match self.score(split.test(), &forecast) {
                Ok(error) => (Score::Error(error), Some(forecast), Some(fitted)),
                Err(reason) => (Score::Unavailable { reason }, None, None),
            },
            Err(err) => (
                Score::Unavailable {
                    reason: err.to_string(),
                },
                None,
                None,
            ),
        };

        match &score {
            Score::Error(error) => debug!(
                key = %split.key(),
                seasonal = seasonal.name,
                model = model.name,
                mae = error,
                "job scored"
            ),
            Score::Unavailable { reason } => warn!(
                key = %split.key(),
                seasonal = seasonal.name,
                model = model.name,
                %reason,
                "job unavailable"
            ),
        }

        EvaluationResult {
            job,
            key: split.key().clone(),
            seasonal: seasonal.name,
            model: model.name,
            score,
            forecast,
            fitted,
        }
    }

    fn score(&self, actual: &[f64], forecast: &Forecast) -> std::result::Result<f64, String> {
        if forecast.horizon() != self.config.horizon || forecast.horizon() != actual.len() {
            return Err(format!(
                "forecast has {} values, expected {}",
                forecast.horizon(),
                actual.len()
            ));
        }
        let error = mae(actual, forecast.primary()).map_err(|err| err.to_string())?;
        if !error.is_finite() {
            return Err("non-finite error".to_string());
        }
        Ok(error)
    }

    fn fit_and_forecast(
        &self,
        model: &ModelSpec,
        series: SeasonalSeries,
    ) -> Result<(BoxedForecaster, Forecast)> {
        let horizon = self.config.horizon;
        let Some(timeout) = self.config.fit_timeout else {
            return guarded_fit(model, &series, horizon);
        };

        // The helper thread cannot be cancelled; after a timeout it runs to
        // completion and its result is dropped.
        let (tx, rx) = mpsc::channel();
        let model = model.clone();
        thread::Builder::new()
            .name(format!("fit-{}", model.name))
            .spawn(move || {
                let _ = tx.send(guarded_fit(&model, &series, horizon));
            })
            .map_err(|err| ForecastError::ComputationError(format!("spawn fit thread: {err}")))?;

        match rx.recv_timeout(timeout) {
            Ok(outcome) => outcome,
            Err(mpsc::RecvTimeoutError::Timeout) => Err(ForecastError::FitTimeout {
                millis: timeout.as_millis() as u64,
            }),
            Err(mpsc::RecvTimeoutError::Disconnected) => Err(ForecastError::ComputationError(
                "fit thread exited without a result".to_string(),
            )),
        }
    }
}

/// Fit and forecast, turning a panic inside the fitter into an error.
fn guarded_fit(
    model: &ModelSpec,
    series: &SeasonalSeries,
    horizon: usize,
) -> Result<(BoxedForecaster, Forecast)> {
    panic::catch_unwind(AssertUnwindSafe(|| {
        let fitted = model.fit(series)?;
        let forecast = fitted.predict(horizon)?;
        Ok((fitted, forecast))
    }))
    .unwrap_or_else(|payload| {
        Err(ForecastError::ComputationError(format!(
            "fitter panicked: {}",
            panic_message(payload.as_ref())
        )))
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{DailySeries, SplitSeries};
    use crate::models::{Forecaster, ModelRegistry};
    use crate::seasonality::SeasonalRegistry;
    use chrono::NaiveDate;

    struct Fixed(Vec<f64>);

    impl Forecaster for Fixed {
        fn fit(&mut self, _: &SeasonalSeries) -> Result<()> {
            Ok(())
        }
        fn predict(&self, _: usize) -> Result<Forecast> {
            Ok(Forecast::from_values(self.0.clone()))
        }
        fn fitted_values(&self) -> Option<&[f64]> {
            None
        }
        fn name(&self) -> &str {
            "Fixed"
        }
    }

    fn split(values: Vec<f64>, horizon: usize) -> SplitSeries {
        let start = NaiveDate::from_ymd_opt(2016, 1, 1).unwrap();
        DailySeries::new(SeriesKey::new("City Hotel", "Direct"), start, values)
            .unwrap()
            .split(horizon)
            .unwrap()
    }

    fn registry(specs: Vec<ModelSpec>) -> ModelRegistry {
        let mut registry = ModelRegistry::new();
        for spec in specs {
            registry.register(spec).unwrap();
        }
        registry
    }

    fn evaluator(horizon: usize) -> Evaluator {
        Evaluator::new(EvaluatorConfig {
            horizon,
            ..EvaluatorConfig::default()
        })
    }

    #[test]
    fn score_ordering_puts_unavailable_last() {
        let unavailable = Score::Unavailable {
            reason: "x".to_string(),
        };
        assert_eq!(Score::Error(1.0).rank_cmp(&Score::Error(2.0)), Ordering::Less);
        assert_eq!(Score::Error(9e9).rank_cmp(&unavailable), Ordering::Less);
        assert_eq!(unavailable.rank_cmp(&Score::Error(0.0)), Ordering::Greater);
        assert_eq!(unavailable.rank_cmp(&unavailable.clone()), Ordering::Equal);
    }

    #[test]
    fn scores_fixed_forecast_with_mae() {
        let series = vec![split((0..20).map(f64::from).collect(), 2)];
        let seasonal = SeasonalRegistry::standard().select(&["weekly"]).unwrap();
        let models = registry(vec![ModelSpec::new("fixed", |_| {
            Ok(Box::new(Fixed(vec![18.0, 21.0])) as BoxedForecaster)
        })]);
        let grid = CombinationGrid::new(&series, &seasonal, &models);

        let results = evaluator(2).evaluate(&grid).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].score, Score::Error(1.0));
        assert_eq!(results[0].model, "fixed");
        assert!(results[0].fitted.is_some());
    }

    #[test]
    fn failures_are_contained() {
        let series = vec![split(vec![5.0; 20], 2)];
        let seasonal = SeasonalRegistry::standard().select(&["weekly"]).unwrap();
        let models = registry(vec![
            ModelSpec::new("fails", |_| {
                Err(ForecastError::ComputationError("no convergence".to_string()))
            }),
            ModelSpec::new("panics", |_| panic!("boom")),
            ModelSpec::new("short", |_| Ok(Box::new(Fixed(vec![5.0])) as BoxedForecaster)),
            ModelSpec::new("nan", |_| {
                Ok(Box::new(Fixed(vec![f64::NAN, 5.0])) as BoxedForecaster)
            }),
        ]);
        let grid = CombinationGrid::new(&series, &seasonal, &models);

        let results = evaluator(2).evaluate(&grid).unwrap();
        assert_eq!(results.len(), 4);
        assert!(results.iter().all(|r| !r.score.is_available()));
        assert!(results.iter().all(|r| r.fitted.is_none()));
        assert!(results[0].score.reason().unwrap().contains("no convergence"));
        assert!(results[1].score.reason().unwrap().contains("boom"));
        assert!(results[2].score.reason().unwrap().contains("expected 2"));
        assert_eq!(results[3].score.reason(), Some("non-finite error"));
    }

    #[test]
    fn slow_fit_times_out() {
        let series = vec![split(vec![5.0; 20], 2)];
        let seasonal = SeasonalRegistry::standard().select(&["weekly"]).unwrap();
        let models = registry(vec![ModelSpec::new("slow", |_| {
            thread::sleep(Duration::from_millis(500));
            Ok(Box::new(Fixed(vec![5.0, 5.0])) as BoxedForecaster)
        })]);
        let grid = CombinationGrid::new(&series, &seasonal, &models);

        let evaluator = Evaluator::new(EvaluatorConfig {
            horizon: 2,
            fit_timeout: Some(Duration::from_millis(20)),
            threads: Some(1),
        });
        let results = evaluator.evaluate(&grid).unwrap();
        assert_eq!(
            results[0].score.reason(),
            Some(ForecastError::FitTimeout { millis: 20 }.to_string().as_str())
        );
    }

    #[test]
    fn results_keep_grid_order() {
        let series: Vec<_> = (0..3).map(|i| split(vec![i as f64; 40], 5)).collect();
        let seasonal = SeasonalRegistry::standard();
        let models = registry(vec![ModelSpec::new("fixed", |s| {
            let last = s.values()[s.len() - 1];
            Ok(Box::new(Fixed(vec![last; 5])) as BoxedForecaster)
        })]);
        let grid = CombinationGrid::new(&series, &seasonal, &models);

        let results = evaluator(5).evaluate(&grid).unwrap();
        assert_eq!(results.len(), 12);
        assert!(results.iter().enumerate().all(|(i, r)| r.job.ordinal == i));
        assert!(results.iter().all(|r| r.score == Score::Error(0.0)));
    }
}
