//! Decomposition-based forecasting.
//!
//! The series is split with STL (one declared period) or MSTL (several).
//! The seasonally adjusted series is forecast by a non-seasonal model and
//! the last cycle of every seasonal component is repeated on top.

use crate::core::Forecast;
use crate::error::{ForecastError, Result};
use crate::models::arima::AutoArima;
use crate::models::exponential::AutoEts;
use crate::models::{BoxedForecaster, Forecaster};
use crate::seasonality::{Decomposition, Mstl, SeasonalSeries};
use std::fmt;
use tracing::trace;

/// Model applied to the seasonally adjusted series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrendModel {
    /// AutoETS over SES, Holt and damped Holt.
    #[default]
    Ets,
    /// Non-seasonal AutoARIMA.
    Arima,
}

impl TrendModel {
    fn build(self) -> BoxedForecaster {
        match self {
            TrendModel::Ets => Box::new(AutoEts::new()),
            TrendModel::Arima => Box::new(AutoArima::non_seasonal()),
        }
    }
}

/// STL/MSTL decomposition followed by a trend model.
pub struct StlForecaster {
    trend_model: TrendModel,
    robust: bool,
    decomposition: Option<Decomposition>,
    trend_forecaster: Option<BoxedForecaster>,
    fitted: Option<Vec<f64>>,
}

impl StlForecaster {
    pub fn new(trend_model: TrendModel) -> Self {
        Self {
            trend_model,
            robust: false,
            decomposition: None,
            trend_forecaster: None,
            fitted: None,
        }
    }

    pub fn ets() -> Self {
        Self::new(TrendModel::Ets)
    }

    pub fn arima() -> Self {
        Self::new(TrendModel::Arima)
    }

    /// Use robustness weights in the decomposition.
    #[cfg(test)]
    fn robust(mut self) -> Self {
        self.robust = true;
        self
    }

    pub fn decomposition(&self) -> Option<&Decomposition> {
        self.decomposition.as_ref()
    }

    /// Repeat the last complete cycle of `component` for `horizon` steps.
    fn project_seasonal(component: &[f64], period: usize, horizon: usize) -> Vec<f64> {
        let last_cycle = &component[component.len().saturating_sub(period)..];
        (0..horizon).map(|h| last_cycle[h % last_cycle.len()]).collect()
    }
}

impl fmt::Debug for StlForecaster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StlForecaster")
            .field("trend_model", &self.trend_model)
            .field("robust", &self.robust)
            .field("fitted", &self.is_fitted())
            .finish()
    }
}

impl Forecaster for StlForecaster {
    fn fit(&mut self, series: &SeasonalSeries) -> Result<()> {
        if !series.is_seasonal() {
            return Err(ForecastError::InvalidParameter(
                "decomposition needs a seasonal period of at least 2".to_string(),
            ));
        }
        let values = series.values();
        let longest = series.primary_period();
        if values.len() < 2 * longest {
            return Err(ForecastError::InsufficientData {
                needed: 2 * longest,
                got: values.len(),
            });
        }

        let mut mstl = Mstl::new(series.periods());
        if self.robust {
            mstl = mstl.robust();
        }
        let decomposition = mstl.decompose(values).ok_or_else(|| {
            ForecastError::ComputationError("seasonal decomposition failed".to_string())
        })?;

        for (idx, period) in decomposition.periods.iter().enumerate() {
            trace!(
                period,
                strength = decomposition.seasonal_strength(idx).unwrap_or_default(),
                "seasonal component"
            );
        }
        trace!(strength = decomposition.trend_strength(), "trend component");

        let adjusted = decomposition.seasonally_adjusted();
        let mut trend_forecaster = self.trend_model.build();
        trend_forecaster.fit(&SeasonalSeries::new(adjusted, &[]))?;

        let seasonal = decomposition.total_seasonal();
        let fitted = trend_forecaster
            .fitted_values()
            .map(|trend| trend.iter().zip(&seasonal).map(|(t, s)| t + s).collect());

        self.decomposition = Some(decomposition);
        self.trend_forecaster = Some(trend_forecaster);
        self.fitted = Some(fitted.unwrap_or_else(|| vec![f64::NAN; values.len()]));
        Ok(())
    }

    fn predict(&self, horizon: usize) -> Result<Forecast> {
        let decomposition = self
            .decomposition
            .as_ref()
            .ok_or(ForecastError::FitRequired)?;
        let trend_forecaster = self
            .trend_forecaster
            .as_ref()
            .ok_or(ForecastError::FitRequired)?;

        let mut forecast = trend_forecaster.predict(horizon)?;
        for (component, &period) in decomposition.seasonal.iter().zip(&decomposition.periods) {
            forecast.add_component(&Self::project_seasonal(component, period, horizon))?;
        }
        Ok(forecast)
    }

    fn fitted_values(&self) -> Option<&[f64]> {
        self.fitted.as_deref()
    }

    fn name(&self) -> &str {
        match self.trend_model {
            TrendModel::Ets => "STL+ETS",
            TrendModel::Arima => "STL+ARIMA",
        }
    }
}
