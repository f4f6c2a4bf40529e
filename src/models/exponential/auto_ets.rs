//! Automatic ETS model selection.
//!
//! Fits SES, Holt and damped Holt and keeps the one with the lowest
//! information criterion.

use crate::core::Forecast;
use crate::error::{ForecastError, Result};
use crate::models::exponential::ets::{Ets, TrendType};
use crate::models::Forecaster;
use crate::seasonality::SeasonalSeries;

/// Selection criterion for AutoETS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionCriterion {
    #[default]
    AIC,
    AICc,
}

/// Automatic ETS model selection.
#[derive(Debug, Clone, Default)]
pub struct AutoEts {
    criterion: SelectionCriterion,
    selected: Option<Ets>,
    /// Every candidate that fitted, with its score, in candidate order.
    scores: Vec<(TrendType, f64)>,
}

impl AutoEts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_criterion(mut self, criterion: SelectionCriterion) -> Self {
        self.criterion = criterion;
        self
    }

    pub fn selected_trend(&self) -> Option<TrendType> {
        self.selected.as_ref().map(Ets::trend_type)
    }

    pub fn scores(&self) -> &[(TrendType, f64)] {
        &self.scores
    }

    fn score(&self, model: &Ets) -> Option<f64> {
        match self.criterion {
            SelectionCriterion::AIC => model.aic(),
            SelectionCriterion::AICc => model.aicc(),
        }
    }
}

impl Forecaster for AutoEts {
    fn fit(&mut self, series: &SeasonalSeries) -> Result<()> {
        if series.len() < 2 {
            return Err(ForecastError::InsufficientData {
                needed: 2,
                got: series.len(),
            });
        }

        self.scores.clear();
        let mut best: Option<(Ets, f64)> = None;
        for trend in [TrendType::None, TrendType::Additive, TrendType::AdditiveDamped] {
            let mut model = Ets::new(trend);
            if model.fit(series).is_err() {
                continue;
            }
            let Some(score) = self.score(&model) else {
                continue;
            };
            self.scores.push((trend, score));
            // Strict comparison: ties keep the simpler candidate.
            if best.as_ref().map_or(true, |(_, s)| score < *s) {
                best = Some((model, score));
            }
        }

        self.selected = Some(best.map(|(model, _)| model).ok_or_else(|| {
            ForecastError::ComputationError("no ETS candidate could be fitted".to_string())
        })?);
        Ok(())
    }

    fn predict(&self, horizon: usize) -> Result<Forecast> {
        self.selected
            .as_ref()
            .ok_or(ForecastError::FitRequired)?
            .predict(horizon)
    }

    fn fitted_values(&self) -> Option<&[f64]> {
        self.selected.as_ref()?.fitted_values()
    }

    fn name(&self) -> &str {
        "AutoETS"
    }
}
