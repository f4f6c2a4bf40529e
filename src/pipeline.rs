//! End-to-end run: bookings in, per-series best configuration out.

use crate::config::PipelineConfig;
use crate::error::{ForecastError, Result};
use crate::grid::{CombinationGrid, EvaluationResult, Evaluator, Selection};
use crate::io::{read_bookings_file, BookingEvent};
use crate::models::ModelRegistry;
use crate::seasonality::SeasonalRegistry;
use crate::store::SeriesStore;
use tracing::info;

/// Everything a run produced.
#[derive(Debug)]
pub struct PipelineOutput {
    pub store: SeriesStore,
    /// Every job in grid order. Fitted handles of losing jobs are dropped.
    pub results: Vec<EvaluationResult>,
    pub selection: Selection,
}

/// Configured run over the standard registries.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Read `config.input` and run the grid over it.
    ///
    /// Names are resolved before the file is touched.
    pub fn run(&self) -> Result<PipelineOutput> {
        let input = self.config.input.as_ref().ok_or_else(|| {
            ForecastError::Config("no input file configured".to_string())
        })?;
        let registries = self.config.validate()?;
        let events = read_bookings_file(input)?;
        self.evaluate(self.aggregate(&events)?, registries)
    }

    /// Aggregate events and run the grid.
    pub fn run_events(&self, events: &[BookingEvent]) -> Result<PipelineOutput> {
        let registries = self.config.validate()?;
        self.evaluate(self.aggregate(events)?, registries)
    }

    /// Run the grid over already aggregated series.
    pub fn run_store(&self, store: SeriesStore) -> Result<PipelineOutput> {
        let registries = self.config.validate()?;
        self.evaluate(store, registries)
    }

    fn aggregate(&self, events: &[BookingEvent]) -> Result<SeriesStore> {
        SeriesStore::from_events(
            events,
            &self.config.segment_filter(),
            self.config.include_canceled,
        )
    }

    /// Data problems fail here, before any model is fit.
    fn evaluate(
        &self,
        store: SeriesStore,
        (seasonal, models): (SeasonalRegistry, ModelRegistry),
    ) -> Result<PipelineOutput> {
        let splits = store.split_all(self.config.horizon)?;

        let grid = CombinationGrid::new(&splits, &seasonal, &models);
        info!(
            series = splits.len(),
            seasonal = seasonal.len(),
            models = models.len(),
            jobs = grid.len(),
            "built combination grid"
        );

        let mut results = Evaluator::new(self.config.evaluator_config()?).evaluate(&grid)?;
        let selection = Selection::select(&mut results, &splits);

        Ok(PipelineOutput {
            store,
            results,
            selection,
        })
    }
}
