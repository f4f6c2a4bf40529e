//! Forecast result structure for holding point predictions.

use crate::error::{ForecastError, Result};

/// Point predictions for consecutive future steps.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Forecast {
    point: Vec<f64>,
}

impl Forecast {
    /// Create an empty forecast.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a forecast from point predictions.
    pub fn from_values(values: Vec<f64>) -> Self {
        Self { point: values }
    }

    /// Number of steps.
    pub fn horizon(&self) -> usize {
        self.point.len()
    }

    pub fn is_empty(&self) -> bool {
        self.point.is_empty()
    }

    /// Point predictions.
    pub fn primary(&self) -> &[f64] {
        &self.point
    }

    pub fn into_values(self) -> Vec<f64> {
        self.point
    }

    /// True when every prediction is a finite number.
    pub fn is_finite(&self) -> bool {
        self.point.iter().all(|v| v.is_finite())
    }

    /// Add a component (e.g. a projected seasonal pattern) step by step.
    pub fn add_component(&mut self, component: &[f64]) -> Result<()> {
        if component.len() != self.point.len() {
            return Err(ForecastError::DimensionMismatch {
                expected: self.point.len(),
                got: component.len(),
            });
        }
        for (p, c) in self.point.iter_mut().zip(component) {
            *p += c;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forecast_from_values() {
        let forecast = Forecast::from_values(vec![1.0, 2.0, 3.0, 4.0]);
        assert!(!forecast.is_empty());
        assert_eq!(forecast.horizon(), 4);
        assert_eq!(forecast.primary(), &[1.0, 2.0, 3.0, 4.0]);
        assert!(forecast.is_finite());
    }

    #[test]
    fn forecast_empty_state() {
        let forecast = Forecast::new();
        assert!(forecast.is_empty());
        assert_eq!(forecast.horizon(), 0);
    }

    #[test]
    fn forecast_adds_components() {
        let mut forecast = Forecast::from_values(vec![10.0, 10.0, 10.0]);
        forecast.add_component(&[1.0, -1.0, 0.5]).unwrap();
        assert_eq!(forecast.primary(), &[11.0, 9.0, 10.5]);

        assert!(forecast.add_component(&[1.0]).is_err());
    }

    #[test]
    fn forecast_detects_non_finite() {
        let forecast = Forecast::from_values(vec![1.0, f64::INFINITY]);
        assert!(!forecast.is_finite());
    }
}
