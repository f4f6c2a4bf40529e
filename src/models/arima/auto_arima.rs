//! Automatic ARIMA order selection.

use crate::core::Forecast;
use crate::error::{ForecastError, Result};
use crate::models::arima::diff::{
    seasonal_difference, suggest_differencing, suggest_seasonal_differencing,
};
use crate::models::arima::model::{Arima, ArimaOrder};
use crate::models::Forecaster;
use crate::seasonality::SeasonalSeries;
use crate::utils::stats::is_constant;
use tracing::trace;

/// Configuration for AutoArima.
#[derive(Debug, Clone)]
pub struct AutoArimaConfig {
    /// Maximum AR order.
    pub max_p: usize,
    /// Maximum MA order.
    pub max_q: usize,
    /// Maximum differencing order.
    pub max_d: usize,
    /// Consider a seasonal difference at the series' primary period.
    pub seasonal: bool,
    /// Longest period a seasonal difference is tried at.
    pub max_seasonal_period: usize,
    /// Complete cycles the training window must hold before a seasonal
    /// difference is tried.
    pub min_seasonal_cycles: usize,
}

impl Default for AutoArimaConfig {
    fn default() -> Self {
        Self {
            max_p: 2,
            max_q: 2,
            max_d: 2,
            seasonal: true,
            max_seasonal_period: 28,
            min_seasonal_cycles: 3,
        }
    }
}

impl AutoArimaConfig {
    pub fn non_seasonal() -> Self {
        Self {
            seasonal: false,
            ..Self::default()
        }
    }

    pub fn with_max_orders(mut self, max_p: usize, max_d: usize, max_q: usize) -> Self {
        self.max_p = max_p;
        self.max_d = max_d;
        self.max_q = max_q;
        self
    }
}

/// Automatic ARIMA selection by AIC.
///
/// The seasonal difference is decided first from the variance reduction at
/// the primary period. The regular differencing order suggested by a
/// variance ratio test is searched together with its neighbours, each with
/// every `(p, q)` up to the configured maxima.
#[derive(Debug, Clone, Default)]
pub struct AutoArima {
    config: AutoArimaConfig,
    selected: Option<Arima>,
    scores: Vec<(ArimaOrder, f64)>,
}

impl AutoArima {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: AutoArimaConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// No seasonal differencing, for already deseasonalised input.
    pub fn non_seasonal() -> Self {
        Self::with_config(AutoArimaConfig::non_seasonal())
    }

    pub fn selected_order(&self) -> Option<ArimaOrder> {
        self.selected.as_ref().map(Arima::order)
    }

    /// AIC of every candidate that fitted, in search order.
    pub fn scores(&self) -> &[(ArimaOrder, f64)] {
        &self.scores
    }

    /// Period to seasonally difference at, if any.
    fn seasonal_period(&self, series: &SeasonalSeries) -> Option<usize> {
        if !self.config.seasonal {
            return None;
        }
        let period = series.primary_period();
        let eligible = period >= 2
            && period <= self.config.max_seasonal_period
            && series.complete_cycles(period) >= self.config.min_seasonal_cycles;
        (eligible && suggest_seasonal_differencing(series.values(), period) == 1).then_some(period)
    }

    fn candidate_d(&self, values: &[f64]) -> Vec<usize> {
        let suggested = suggest_differencing(values).min(self.config.max_d);
        let lo = suggested.saturating_sub(1);
        let hi = (suggested + 1).min(self.config.max_d);
        (lo..=hi).collect()
    }
}

impl Forecaster for AutoArima {
    fn fit(&mut self, series: &SeasonalSeries) -> Result<()> {
        let values = series.values();
        if values.len() < 3 {
            return Err(ForecastError::InsufficientData {
                needed: 3,
                got: values.len(),
            });
        }
        if is_constant(values, 1e-12) {
            return Err(ForecastError::ComputationError(
                "ARIMA cannot be fitted to a constant series".to_string(),
            ));
        }

        let period = self.seasonal_period(series);
        let base = match period {
            Some(m) => seasonal_difference(values, m),
            None => values.to_vec(),
        };

        self.scores.clear();
        let mut best: Option<(Arima, f64)> = None;
        for d in self.candidate_d(&base) {
            for p in 0..=self.config.max_p {
                for q in 0..=self.config.max_q {
                    let mut order = ArimaOrder::new(p, d, q);
                    if let Some(m) = period {
                        order = order.with_seasonal_difference(m);
                    }
                    let mut model = Arima::new(order);
                    if let Err(err) = model.fit(series) {
                        trace!(%order, %err, "ARIMA candidate rejected");
                        continue;
                    }
                    let Some(aic) = model.aic() else { continue };
                    self.scores.push((order, aic));
                    if best.as_ref().map_or(true, |(_, b)| aic < *b) {
                        best = Some((model, aic));
                    }
                }
            }
        }

        self.selected = Some(best.map(|(model, _)| model).ok_or_else(|| {
            ForecastError::ComputationError("no ARIMA candidate could be fitted".to_string())
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
        "AutoARIMA"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weekly_with_noise(n: usize) -> Vec<f64> {
        let cycle = [12.0, 15.0, 9.0, 20.0, 11.0, 5.0, 16.0];
        (0..n)
            .map(|i| cycle[i % 7] + ((i * 37) % 5) as f64 * 0.1)
            .collect()
    }

    #[test]
    fn searches_full_pq_grid() {
        let series = SeasonalSeries::new(weekly_with_noise(70), &[7]);
        let mut model = AutoArima::new();
        model.fit(&series).unwrap();

        let order = model.selected_order().unwrap();
        assert!(order.p <= 2 && order.q <= 2 && order.d <= 2);
        assert_eq!(model.scores().len() % 9, 0);
        assert_eq!(model.predict(30).unwrap().horizon(), 30);
    }

    #[test]
    fn weekly_pattern_gets_seasonal_difference() {
        let series = SeasonalSeries::new(weekly_with_noise(84), &[7]);
        let mut model = AutoArima::new();
        model.fit(&series).unwrap();
        let order = model.selected_order().unwrap();
        assert!(order.is_seasonal());
        assert_eq!(order.period, 7);
    }

    #[test]
    fn long_periods_are_not_seasonally_differenced() {
        let values = weekly_with_noise(210);
        let mut model = AutoArima::new();
        model.fit(&SeasonalSeries::new(values, &[35])).unwrap();
        assert!(!model.selected_order().unwrap().is_seasonal());
    }

    #[test]
    fn needs_three_cycles_for_seasonal_difference() {
        let mut model = AutoArima::new();
        model
            .fit(&SeasonalSeries::new(weekly_with_noise(80), &[28]))
            .unwrap();
        assert!(!model.selected_order().unwrap().is_seasonal());
    }

    #[test]
    fn non_seasonal_never_differences_seasonally() {
        let mut model = AutoArima::non_seasonal();
        model
            .fit(&SeasonalSeries::new(weekly_with_noise(84), &[7]))
            .unwrap();
        assert!(!model.selected_order().unwrap().is_seasonal());
    }

    #[test]
    fn constant_input_fails() {
        let mut model = AutoArima::new();
        let err = model.fit(&SeasonalSeries::new(vec![0.0; 60], &[7])).unwrap_err();
        assert!(matches!(err, ForecastError::ComputationError(_)));
        assert!(model.predict(1).is_err());
    }
}
