//! The cross product of series, seasonal transforms and models.

use crate::core::SplitSeries;
use crate::models::{ModelRegistry, ModelSpec};
use crate::seasonality::{SeasonalRegistry, SeasonalSpec};

/// One cell of the grid, addressed by registry positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Job {
    /// Enumeration position; breaks ties during selection.
    pub ordinal: usize,
    pub series: usize,
    pub seasonal: usize,
    pub model: usize,
}

/// Every `(series, seasonal, model)` combination, series-major, then
/// seasonal, then model. Nothing is skipped.
#[derive(Debug)]
pub struct CombinationGrid<'a> {
    series: &'a [SplitSeries],
    seasonal: Vec<&'a SeasonalSpec>,
    models: Vec<&'a ModelSpec>,
    jobs: Vec<Job>,
}

impl<'a> CombinationGrid<'a> {
    pub fn new(
        series: &'a [SplitSeries],
        seasonal: &'a SeasonalRegistry,
        models: &'a ModelRegistry,
    ) -> Self {
        let mut jobs = Vec::with_capacity(series.len() * seasonal.len() * models.len());
        for s in 0..series.len() {
            for t in 0..seasonal.len() {
                for m in 0..models.len() {
                    jobs.push(Job {
                        ordinal: jobs.len(),
                        series: s,
                        seasonal: t,
                        model: m,
                    });
                }
            }
        }
        Self {
            series,
            seasonal: seasonal.iter().collect(),
            models: models.iter().collect(),
            jobs,
        }
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    pub fn series(&self) -> &'a [SplitSeries] {
        self.series
    }

    pub fn split(&self, job: &Job) -> &'a SplitSeries {
        &self.series[job.series]
    }

    pub fn seasonal_spec(&self, job: &Job) -> &'a SeasonalSpec {
        self.seasonal[job.seasonal]
    }

    pub fn model_spec(&self, job: &Job) -> &'a ModelSpec {
        self.models[job.model]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{DailySeries, SeriesKey};
    use chrono::NaiveDate;

    fn splits(count: usize) -> Vec<SplitSeries> {
        let start = NaiveDate::from_ymd_opt(2016, 1, 1).unwrap();
        (0..count)
            .map(|i| {
                DailySeries::new(SeriesKey::new("Hotel", format!("S{i}")), start, vec![1.0; 40])
                    .unwrap()
                    .split(10)
                    .unwrap()
            })
            .collect()
    }

    #[test]
    fn enumerates_full_product_in_order() {
        let series = splits(3);
        let seasonal = SeasonalRegistry::standard();
        let models = ModelRegistry::standard();
        let grid = CombinationGrid::new(&series, &seasonal, &models);

        assert_eq!(grid.len(), 3 * 4 * 4);
        let jobs = grid.jobs();
        assert_eq!(
            jobs[0],
            Job {
                ordinal: 0,
                series: 0,
                seasonal: 0,
                model: 0
            }
        );
        assert_eq!((jobs[1].seasonal, jobs[1].model), (0, 1));
        assert_eq!((jobs[4].seasonal, jobs[4].model), (1, 0));
        assert_eq!(jobs[16].series, 1);
        assert!(jobs.iter().enumerate().all(|(i, j)| j.ordinal == i));

        let last = jobs[jobs.len() - 1];
        assert_eq!(grid.split(&last).key().segment, "S2");
        assert_eq!(grid.seasonal_spec(&last).name, "annual");
        assert_eq!(grid.model_spec(&last).name, "stl_arima");
    }

    #[test]
    fn empty_registry_gives_empty_grid() {
        let series = splits(2);
        let seasonal = SeasonalRegistry::new();
        let models = ModelRegistry::standard();
        let grid = CombinationGrid::new(&series, &seasonal, &models);
        assert!(grid.is_empty());
    }
}
