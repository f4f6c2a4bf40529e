//! Per-series winner selection.

use super::evaluate::{EvaluationResult, Score};
use crate::core::{Forecast, SeriesKey, SplitSeries};
use crate::error::{ForecastError, Result};
use crate::models::BoxedForecaster;
use crate::utils::ValueRange;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::fmt;
use tracing::{info, warn};

/// One job's place in its series' ranking.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedEntry {
    /// 1-based; unavailable jobs rank after every scored one.
    pub rank: usize,
    pub ordinal: usize,
    pub seasonal: &'static str,
    pub model: &'static str,
    pub score: Score,
}

/// The lowest-error job of a series.
pub struct Winner {
    pub key: SeriesKey,
    pub seasonal: &'static str,
    pub model: &'static str,
    pub ordinal: usize,
    pub error: f64,
    pub forecast: Forecast,
    pub fitted: BoxedForecaster,
    /// Held-out observations the forecast was scored against.
    pub actuals: Vec<f64>,
    pub test_start: NaiveDate,
    pub actual_range: Option<ValueRange>,
}

impl Winner {
    /// Dates of the held-out window.
    pub fn dates(&self) -> Vec<NaiveDate> {
        (0..self.actuals.len())
            .map(|i| self.test_start + chrono::Duration::days(i as i64))
            .collect()
    }
}

impl fmt::Debug for Winner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Winner")
            .field("key", &self.key)
            .field("seasonal", &self.seasonal)
            .field("model", &self.model)
            .field("ordinal", &self.ordinal)
            .field("error", &self.error)
            .field("fitted", &self.fitted.name())
            .finish()
    }
}

/// Outcome of selection for one series.
#[derive(Debug)]
pub enum BestConfig {
    Found(Winner),
    /// Every job of the series was unavailable.
    NoViableModel {
        key: SeriesKey,
        /// `(seasonal, model, reason)` for each failed job.
        failures: Vec<(&'static str, &'static str, String)>,
    },
}

impl BestConfig {
    pub fn key(&self) -> &SeriesKey {
        match self {
            BestConfig::Found(winner) => &winner.key,
            BestConfig::NoViableModel { key, .. } => key,
        }
    }

    pub fn winner(&self) -> Option<&Winner> {
        match self {
            BestConfig::Found(winner) => Some(winner),
            BestConfig::NoViableModel { .. } => None,
        }
    }

    pub fn is_viable(&self) -> bool {
        self.winner().is_some()
    }

    /// Forecast again from the retained fitted handle.
    pub fn regenerate(&self, horizon: usize) -> Result<Forecast> {
        match self {
            BestConfig::Found(winner) => winner.fitted.predict(horizon),
            BestConfig::NoViableModel { key, .. } => Err(ForecastError::ComputationError(
                format!("no viable model for {key}"),
            )),
        }
    }
}

/// Winners and rankings for every series of a grid.
#[derive(Debug)]
pub struct Selection {
    best: Vec<BestConfig>,
    ranked: BTreeMap<SeriesKey, Vec<RankedEntry>>,
}

impl Selection {
    /// Pick the lowest error per series; ties go to the earliest job.
    ///
    /// The winner's fitted handle is moved out of `results` and every other
    /// handle is dropped. `splits` must be the series the grid was built
    /// from; each one gets an entry even when it has no results.
    pub fn select(results: &mut [EvaluationResult], splits: &[SplitSeries]) -> Self {
        let mut groups: Vec<Vec<usize>> = vec![Vec::new(); splits.len()];
        for (i, result) in results.iter().enumerate() {
            if let Some(group) = groups.get_mut(result.job.series) {
                group.push(i);
            }
        }

        let mut best = Vec::with_capacity(splits.len());
        let mut ranked = BTreeMap::new();
        for (split, mut group) in splits.iter().zip(groups) {
            group.sort_by(|&a, &b| {
                results[a]
                    .score
                    .rank_cmp(&results[b].score)
                    .then(results[a].job.ordinal.cmp(&results[b].job.ordinal))
            });

            let entries: Vec<RankedEntry> = group
                .iter()
                .enumerate()
                .map(|(pos, &i)| RankedEntry {
                    rank: pos + 1,
                    ordinal: results[i].job.ordinal,
                    seasonal: results[i].seasonal,
                    model: results[i].model,
                    score: results[i].score.clone(),
                })
                .collect();
            ranked.insert(split.key().clone(), entries);

            best.push(Self::best_of(results, &group, split));
            for &i in group.iter().skip(1) {
                results[i].fitted = None;
            }
        }

        let viable = best.iter().filter(|b| b.is_viable()).count();
        info!(series = best.len(), viable, "selected best configurations");
        Self { best, ranked }
    }

    fn best_of(
        results: &mut [EvaluationResult],
        group: &[usize],
        split: &SplitSeries,
    ) -> BestConfig {
        let no_viable = |results: &[EvaluationResult]| {
            let failures = group
                .iter()
                .map(|&i| {
                    let r = &results[i];
                    (r.seasonal, r.model, r.score.reason().unwrap_or_default().to_string())
                })
                .collect::<Vec<_>>();
            warn!(key = %split.key(), failed_jobs = failures.len(), "no viable model");
            BestConfig::NoViableModel {
                key: split.key().clone(),
                failures,
            }
        };

        let top = match group.first() {
            Some(&top) if results[top].score.is_available() => top,
            _ => return no_viable(&*results),
        };
        let result = &mut results[top];
        let (Some(error), Some(forecast), Some(fitted)) = (
            result.score.error(),
            result.forecast.clone(),
            result.fitted.take(),
        ) else {
            return no_viable(&*results);
        };

        info!(
            key = %split.key(),
            seasonal = result.seasonal,
            model = result.model,
            mae = error,
            "best configuration"
        );
        BestConfig::Found(Winner {
            key: split.key().clone(),
            seasonal: result.seasonal,
            model: result.model,
            ordinal: result.job.ordinal,
            error,
            forecast,
            fitted,
            actuals: split.test().to_vec(),
            test_start: split.test_start(),
            actual_range: ValueRange::of(split.test()),
        })
    }

    /// One entry per series, in key order.
    pub fn best(&self) -> &[BestConfig] {
        &self.best
    }

    pub fn get(&self, key: &SeriesKey) -> Option<&BestConfig> {
        self.best.iter().find(|b| b.key() == key)
    }

    /// All jobs of a series, best first.
    pub fn ranked(&self, key: &SeriesKey) -> Option<&[RankedEntry]> {
        self.ranked.get(key).map(Vec::as_slice)
    }

    pub fn viable_count(&self) -> usize {
        self.best.iter().filter(|b| b.is_viable()).count()
    }

    pub fn no_viable_count(&self) -> usize {
        self.best.len() - self.viable_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::DailySeries;
    use crate::grid::Job;
    use crate::models::Forecaster;
    use crate::seasonality::SeasonalSeries;

    struct Echo(Vec<f64>);

    impl Forecaster for Echo {
        fn fit(&mut self, _: &SeasonalSeries) -> Result<()> {
            Ok(())
        }
        fn predict(&self, horizon: usize) -> Result<Forecast> {
            Ok(Forecast::from_values(self.0.iter().copied().cycle().take(horizon).collect()))
        }
        fn fitted_values(&self) -> Option<&[f64]> {
            None
        }
        fn name(&self) -> &str {
            "Echo"
        }
    }

    fn split(hotel: &str) -> SplitSeries {
        let start = NaiveDate::from_ymd_opt(2017, 1, 1).unwrap();
        DailySeries::new(SeriesKey::new(hotel, "Direct"), start, vec![2.0, 4.0, 6.0, 8.0])
            .unwrap()
            .split(2)
            .unwrap()
    }

    fn result(series: usize, ordinal: usize, hotel: &str, score: Score) -> EvaluationResult {
        let ok = score.is_available();
        EvaluationResult {
            job: Job {
                ordinal,
                series,
                seasonal: 0,
                model: ordinal,
            },
            key: SeriesKey::new(hotel, "Direct"),
            seasonal: "weekly",
            model: if ok { "ok" } else { "broken" },
            score,
            forecast: ok.then(|| Forecast::from_values(vec![6.0, 8.0])),
            fitted: ok.then(|| Box::new(Echo(vec![6.0, 8.0])) as BoxedForecaster),
        }
    }

    fn unavailable() -> Score {
        Score::Unavailable {
            reason: "failed".to_string(),
        }
    }

    #[test]
    fn picks_minimum_and_breaks_ties_by_ordinal() {
        let splits = vec![split("A")];
        let mut results = vec![
            result(0, 0, "A", Score::Error(3.0)),
            result(0, 1, "A", Score::Error(1.0)),
            result(0, 2, "A", unavailable()),
            result(0, 3, "A", Score::Error(1.0)),
        ];
        let selection = Selection::select(&mut results, &splits);

        let winner = selection.best()[0].winner().unwrap();
        assert_eq!(winner.ordinal, 1);
        assert_eq!(winner.error, 1.0);
        assert_eq!(winner.actuals, vec![6.0, 8.0]);
        assert_eq!(winner.dates()[0], NaiveDate::from_ymd_opt(2017, 1, 3).unwrap());

        let ranked = selection.ranked(&SeriesKey::new("A", "Direct")).unwrap();
        let order: Vec<usize> = ranked.iter().map(|e| e.ordinal).collect();
        assert_eq!(order, vec![1, 3, 0, 2]);
        assert_eq!(ranked[3].rank, 4);

        assert!(results.iter().all(|r| r.fitted.is_none()));
    }

    #[test]
    fn all_failed_series_is_reported() {
        let splits = vec![split("A"), split("B")];
        let mut results = vec![
            result(0, 0, "A", unavailable()),
            result(0, 1, "A", unavailable()),
            result(1, 2, "B", Score::Error(0.5)),
        ];
        let selection = Selection::select(&mut results, &splits);

        assert_eq!(selection.best().len(), 2);
        assert_eq!(selection.viable_count(), 1);
        assert_eq!(selection.no_viable_count(), 1);
        match &selection.best()[0] {
            BestConfig::NoViableModel { key, failures } => {
                assert_eq!(key.hotel, "A");
                assert_eq!(failures.len(), 2);
                assert_eq!(failures[0].2, "failed");
            }
            other => panic!("expected no viable model, got {other:?}"),
        }
        assert!(selection.best()[0].regenerate(2).is_err());
    }

    #[test]
    fn series_without_results_is_not_omitted() {
        let splits = vec![split("A")];
        let selection = Selection::select(&mut [], &splits);
        assert_eq!(selection.best().len(), 1);
        assert!(!selection.best()[0].is_viable());
    }

    #[test]
    fn regenerate_uses_retained_handle() {
        let splits = vec![split("A")];
        let mut results = vec![result(0, 0, "A", Score::Error(0.0))];
        let selection = Selection::select(&mut results, &splits);
        let best = selection.get(&SeriesKey::new("A", "Direct")).unwrap();
        assert_eq!(best.regenerate(3).unwrap().primary(), &[6.0, 8.0, 6.0]);
        assert_eq!(best.winner().unwrap().actual_range.as_ref().unwrap().max, 8.0);
    }
}
