//! Differencing utilities for ARIMA models.

use crate::utils::stats::variance;

/// Apply `d` rounds of first differencing.
pub fn difference(series: &[f64], d: usize) -> Vec<f64> {
    let mut result = series.to_vec();
    for _ in 0..d {
        if result.len() <= 1 {
            break;
        }
        result = result.windows(2).map(|w| w[1] - w[0]).collect();
    }
    result
}

/// Apply one round of seasonal differencing at `period`.
pub fn seasonal_difference(series: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || series.len() <= period {
        return series.to_vec();
    }
    series[period..]
        .iter()
        .zip(series)
        .map(|(curr, prev)| curr - prev)
        .collect()
}

/// Undo `d` rounds of first differencing on forecasted values, continuing
/// from the end of `original`.
pub fn integrate(differenced: &[f64], original: &[f64], d: usize) -> Vec<f64> {
    let mut result = differenced.to_vec();
    for level in (0..d).rev() {
        let mut acc = difference(original, level).last().copied().unwrap_or(0.0);
        for value in result.iter_mut() {
            acc += *value;
            *value = acc;
        }
    }
    result
}

/// Undo seasonal differencing at `period`: each forecast adds the value one
/// cycle earlier, drawing on `original` and then on earlier forecasts.
pub fn seasonal_integrate(differenced: &[f64], original: &[f64], period: usize) -> Vec<f64> {
    if period == 0 {
        return differenced.to_vec();
    }
    let mut extended = original.to_vec();
    for &value in differenced {
        let base = extended
            .len()
            .checked_sub(period)
            .map_or(0.0, |i| extended[i]);
        extended.push(value + base);
    }
    extended.split_off(original.len())
}

/// Suggest a differencing order (0, 1 or 2) with a variance ratio test:
/// difference while doing so shrinks the variance noticeably.
pub fn suggest_differencing(series: &[f64]) -> usize {
    if series.len() < 3 {
        return 0;
    }
    let var_0 = variance(series);
    let diff_1 = difference(series, 1);
    let var_1 = variance(&diff_1);
    if !(var_0 > 0.0 && var_1 / var_0 < 0.9) {
        return 0;
    }

    let diff_2 = difference(&diff_1, 1);
    if diff_2.len() >= 2 && var_1 > 0.0 {
        let var_2 = variance(&diff_2);
        if var_2 / var_1 < 0.9 && var_2 < var_0 {
            return 2;
        }
    }
    1
}

/// Suggest a seasonal differencing order (0 or 1): 1 when differencing at
/// `period` removes at least 30% of the variance.
pub fn suggest_seasonal_differencing(series: &[f64], period: usize) -> usize {
    if period < 2 || series.len() < 2 * period {
        return 0;
    }
    let original = variance(series);
    let differenced = variance(&seasonal_difference(series, period));
    if original > 0.0 && differenced < 0.7 * original {
        1
    } else {
        0
    }
}
