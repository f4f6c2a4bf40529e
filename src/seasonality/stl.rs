//! STL (Seasonal-Trend decomposition using LOESS).
//!
//! Splits a series into trend, one seasonal component and a remainder.
//! Smoothing uses tricube-weighted local means, which keeps the
//! decomposition cheap enough to run inside every grid job.

use crate::utils::stats::{median, population_variance};

/// Output of an STL or MSTL decomposition.
#[derive(Debug, Clone, PartialEq)]
pub struct Decomposition {
    /// Trend component.
    pub trend: Vec<f64>,
    /// Seasonal periods, ascending, matching `seasonal`.
    pub periods: Vec<usize>,
    /// One seasonal component per period.
    pub seasonal: Vec<Vec<f64>>,
    /// Remainder component.
    pub remainder: Vec<f64>,
}

impl Decomposition {
    /// Sum of all seasonal components.
    pub fn total_seasonal(&self) -> Vec<f64> {
        let mut total = vec![0.0; self.trend.len()];
        for component in &self.seasonal {
            for (t, s) in total.iter_mut().zip(component) {
                *t += s;
            }
        }
        total
    }

    /// Trend plus remainder: the series with every seasonal component removed.
    pub fn seasonally_adjusted(&self) -> Vec<f64> {
        self.trend
            .iter()
            .zip(&self.remainder)
            .map(|(t, r)| t + r)
            .collect()
    }

    /// Seasonal strength of component `idx` (0 to 1).
    pub fn seasonal_strength(&self, idx: usize) -> Option<f64> {
        let component = self.seasonal.get(idx)?;
        Some(strength(component, &self.remainder))
    }

    /// Trend strength (0 to 1).
    pub fn trend_strength(&self) -> f64 {
        strength(&self.trend, &self.remainder)
    }
}

fn strength(component: &[f64], remainder: &[f64]) -> f64 {
    let combined: Vec<f64> = component.iter().zip(remainder).map(|(c, r)| c + r).collect();
    let var_combined = population_variance(&combined);
    if var_combined < 1e-10 {
        return 0.0;
    }
    (1.0 - population_variance(remainder) / var_combined).clamp(0.0, 1.0)
}

/// STL decomposition configuration and algorithm.
#[derive(Debug, Clone)]
pub struct Stl {
    period: usize,
    /// Seasonal smoothing span (odd).
    seasonal_span: usize,
    /// Trend smoothing span (odd).
    trend_span: usize,
    /// Low-pass smoothing span (odd).
    low_pass_span: usize,
    inner_iterations: usize,
    /// Robustness iterations; zero disables reweighting.
    outer_iterations: usize,
}

impl Stl {
    /// Create a decomposer with spans following Cleveland et al. (1990).
    pub fn new(period: usize) -> Self {
        let period = period.max(2);
        let trend_span = (1.5 * period as f64 / (1.0 - 1.5 / (period as f64 + 1.0))).ceil() as usize;
        Self {
            period,
            seasonal_span: make_odd(period.max(7)),
            trend_span: make_odd(trend_span),
            low_pass_span: make_odd(period),
            inner_iterations: 2,
            outer_iterations: 0,
        }
    }

    /// Enable robust fitting with the given number of reweighting passes.
    pub fn robust(mut self, passes: usize) -> Self {
        self.outer_iterations = passes;
        self
    }

    pub fn period(&self) -> usize {
        self.period
    }

    /// Decompose `series`. Needs at least two full cycles.
    pub fn decompose(&self, series: &[f64]) -> Option<Decomposition> {
        let n = series.len();
        if n < 2 * self.period {
            return None;
        }

        let mut seasonal = vec![0.0; n];
        let mut trend = vec![0.0; n];
        let mut weights = vec![1.0; n];

        for pass in 0..=self.outer_iterations {
            for _ in 0..self.inner_iterations {
                let detrended: Vec<f64> = series.iter().zip(&trend).map(|(y, t)| y - t).collect();
                let cycle = self.smooth_cycle_subseries(&detrended, &weights);
                let low_pass = self.low_pass(&cycle);
                for i in 0..n {
                    seasonal[i] = cycle[i] - low_pass[i];
                }

                let deseasonalized: Vec<f64> =
                    series.iter().zip(&seasonal).map(|(y, s)| y - s).collect();
                trend = tricube_smooth(&deseasonalized, self.trend_span, &weights);
            }

            if pass < self.outer_iterations {
                let remainder: Vec<f64> = (0..n).map(|i| series[i] - seasonal[i] - trend[i]).collect();
                weights = bisquare_weights(&remainder);
            }
        }

        let remainder = (0..n).map(|i| series[i] - seasonal[i] - trend[i]).collect();
        Some(Decomposition {
            trend,
            periods: vec![self.period],
            seasonal: vec![seasonal],
            remainder,
        })
    }

    /// Smooth each cycle-subseries (all values sharing a position in the cycle).
    fn smooth_cycle_subseries(&self, detrended: &[f64], weights: &[f64]) -> Vec<f64> {
        let mut result = vec![0.0; detrended.len()];
        for phase in 0..self.period {
            let idx: Vec<usize> = (phase..detrended.len()).step_by(self.period).collect();
            let values: Vec<f64> = idx.iter().map(|&i| detrended[i]).collect();
            let sub_weights: Vec<f64> = idx.iter().map(|&i| weights[i]).collect();
            let smoothed = tricube_smooth(&values, self.seasonal_span, &sub_weights);
            for (&i, v) in idx.iter().zip(smoothed) {
                result[i] = v;
            }
        }
        result
    }

    /// MA(period), MA(period), MA(3), then a LOESS pass.
    fn low_pass(&self, series: &[f64]) -> Vec<f64> {
        let ma = moving_average(&moving_average(&moving_average(series, self.period), self.period), 3);
        tricube_smooth(&ma, self.low_pass_span, &vec![1.0; ma.len()])
    }
}

fn make_odd(n: usize) -> usize {
    if n % 2 == 0 {
        n + 1
    } else {
        n
    }
}

/// Centered moving average, truncated at the edges.
fn moving_average(series: &[f64], window: usize) -> Vec<f64> {
    let n = series.len();
    let half = window / 2;
    (0..n)
        .map(|i| {
            let lo = i.saturating_sub(half);
            let hi = (i + half + 1).min(n);
            series[lo..hi].iter().sum::<f64>() / (hi - lo) as f64
        })
        .collect()
}

/// Tricube-weighted local mean with per-point robustness weights.
fn tricube_smooth(values: &[f64], span: usize, weights: &[f64]) -> Vec<f64> {
    let n = values.len();
    let half = span / 2;
    let max_dist = half as f64 + 1.0;
    (0..n)
        .map(|i| {
            let lo = i.saturating_sub(half);
            let hi = (i + half + 1).min(n);
            let (mut sw, mut sv) = (0.0, 0.0);
            for j in lo..hi {
                let u = (i as f64 - j as f64).abs() / max_dist;
                let w = (1.0 - u.powi(3)).powi(3) * weights[j];
                sw += w;
                sv += w * values[j];
            }
            if sw > 0.0 {
                sv / sw
            } else {
                values[i]
            }
        })
        .collect()
}

fn bisquare_weights(remainder: &[f64]) -> Vec<f64> {
    let abs: Vec<f64> = remainder.iter().map(|r| r.abs()).collect();
    let h = 6.0 * median(&abs);
    remainder
        .iter()
        .map(|r| {
            if h.is_nan() || h <= 1e-10 {
                return 1.0;
            }
            let u = r.abs() / h;
            if u < 1.0 {
                (1.0 - u * u).powi(2)
            } else {
                0.0
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    fn weekly_pattern(n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| 50.0 + 0.1 * i as f64 + 10.0 * (2.0 * PI * i as f64 / 7.0).sin())
            .collect()
    }

    #[test]
    fn components_reconstruct_series() {
        let series = weekly_pattern(84);
        let result = Stl::new(7).decompose(&series).unwrap();

        for i in 0..series.len() {
            let rebuilt = result.trend[i] + result.seasonal[0][i] + result.remainder[i];
            assert_relative_eq!(rebuilt, series[i], epsilon = 1e-9);
        }
        assert_eq!(result.periods, vec![7]);
    }

    #[test]
    fn detects_strong_weekly_seasonality() {
        let result = Stl::new(7).decompose(&weekly_pattern(140)).unwrap();
        assert!(result.seasonal_strength(0).unwrap() > 0.7);
        assert!(result.seasonal_strength(1).is_none());
    }

    #[test]
    fn requires_two_cycles() {
        assert!(Stl::new(28).decompose(&vec![1.0; 55]).is_none());
        assert!(Stl::new(28).decompose(&vec![1.0; 56]).is_some());
    }

    #[test]
    fn all_zero_series_decomposes_to_zero() {
        let result = Stl::new(7).robust(2).decompose(&[0.0; 35]).unwrap();
        assert!(result.trend.iter().all(|v| *v == 0.0));
        assert!(result.total_seasonal().iter().all(|v| *v == 0.0));
        assert_eq!(result.trend_strength(), 0.0);
    }

    #[test]
    fn seasonally_adjusted_removes_seasonal() {
        let series = weekly_pattern(70);
        let result = Stl::new(7).decompose(&series).unwrap();
        let adjusted = result.seasonally_adjusted();
        let seasonal = result.total_seasonal();
        for i in 0..series.len() {
            assert_relative_eq!(adjusted[i] + seasonal[i], series[i], epsilon = 1e-9);
        }
    }
}
