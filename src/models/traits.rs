//! Forecaster trait defining the common interface for all models.

use crate::core::Forecast;
use crate::error::Result;
use crate::seasonality::SeasonalSeries;

/// Common interface for all forecasting models.
///
/// This trait is object-safe and can be used with `Box<dyn Forecaster>`.
/// Models are `Send` so a fit can run on a helper thread.
pub trait Forecaster: Send {
    /// Fit the model to a seasonally annotated series.
    fn fit(&mut self, series: &SeasonalSeries) -> Result<()>;

    /// Generate exactly `horizon` point predictions.
    fn predict(&self, horizon: usize) -> Result<Forecast>;

    /// Get the fitted values (in-sample predictions).
    fn fitted_values(&self) -> Option<&[f64]>;

    /// Get the model name.
    fn name(&self) -> &str;

    /// Check if the model has been fitted.
    fn is_fitted(&self) -> bool {
        self.fitted_values().is_some()
    }
}

/// Type alias for boxed forecaster trait objects.
pub type BoxedForecaster = Box<dyn Forecaster>;

/// In-sample residuals `actual - fitted`, skipping positions where the
/// model produced no fitted value.
pub(crate) fn residuals(actual: &[f64], fitted: &[f64]) -> Vec<f64> {
    actual
        .iter()
        .zip(fitted)
        .filter(|(_, f)| f.is_finite())
        .map(|(a, f)| a - f)
        .collect()
}
