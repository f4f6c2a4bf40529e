//! Accuracy metrics for forecast evaluation.
//!
//! The grid ranks jobs by mean absolute error. Percentage errors are not
//! offered as a ranking metric: low-volume segments have days with zero
//! bookings, where MAPE is undefined.

use crate::error::{ForecastError, Result};

/// Mean absolute error between held-out actuals and a forecast.
///
/// Fails when the slices are empty or differ in length.
///
/// # Example
/// ```
/// use booking_forecast::utils::metrics::mae;
///
/// let err = mae(&[1.0, 2.0, 3.0], &[2.0, 2.0, 1.0]).unwrap();
/// assert!((err - 1.0).abs() < 1e-12);
/// ```
pub fn mae(actual: &[f64], predicted: &[f64]) -> Result<f64> {
    check_lengths(actual, predicted)?;
    let total: f64 = actual
        .iter()
        .zip(predicted.iter())
        .map(|(a, p)| (a - p).abs())
        .sum();
    Ok(total / actual.len() as f64)
}

/// Root mean squared error, reported next to MAE for context.
pub fn rmse(actual: &[f64], predicted: &[f64]) -> Result<f64> {
    check_lengths(actual, predicted)?;
    let total: f64 = actual
        .iter()
        .zip(predicted.iter())
        .map(|(a, p)| (a - p).powi(2))
        .sum();
    Ok((total / actual.len() as f64).sqrt())
}

/// Accuracy summary for a winning forecast.
#[derive(Debug, Clone, PartialEq)]
pub struct AccuracyMetrics {
    /// Mean Absolute Error
    pub mae: f64,
    /// Root Mean Squared Error
    pub rmse: f64,
    /// MAE divided by the mean of the actuals (None when the mean is zero)
    pub relative_mae: Option<f64>,
}

/// Calculate the accuracy summary between actual and predicted values.
pub fn calculate_metrics(actual: &[f64], predicted: &[f64]) -> Result<AccuracyMetrics> {
    let mae = mae(actual, predicted)?;
    let rmse = rmse(actual, predicted)?;
    let mean_actual = actual.iter().sum::<f64>() / actual.len() as f64;
    let relative_mae = if mean_actual.abs() > f64::EPSILON {
        Some(mae / mean_actual.abs())
    } else {
        None
    };
    Ok(AccuracyMetrics {
        mae,
        rmse,
        relative_mae,
    })
}

fn check_lengths(actual: &[f64], predicted: &[f64]) -> Result<()> {
    if actual.is_empty() || predicted.is_empty() {
        return Err(ForecastError::EmptyData);
    }
    if actual.len() != predicted.len() {
        return Err(ForecastError::DimensionMismatch {
            expected: actual.len(),
            got: predicted.len(),
        });
    }
    Ok(())
}
