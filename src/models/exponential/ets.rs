//! Non-seasonal exponential smoothing with additive errors.
//!
//! Covers simple exponential smoothing, Holt's linear trend and the damped
//! trend variant. Seasonality is handled upstream by decomposition, so no
//! seasonal state is carried here.

use crate::core::Forecast;
use crate::error::{ForecastError, Result};
use crate::models::traits::residuals;
use crate::models::Forecaster;
use crate::seasonality::SeasonalSeries;
use crate::utils::optimization::{nelder_mead, NelderMeadConfig};
use std::f64::consts::PI;
use std::fmt;

const SMOOTHING_BOUNDS: (f64, f64) = (0.0001, 0.9999);
const DAMPING_BOUNDS: (f64, f64) = (0.8, 0.98);

/// Trend component of an ETS model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrendType {
    /// Level only (SES).
    None,
    /// Linear trend (Holt).
    Additive,
    /// Trend shrunk towards flat by `φ` (damped Holt).
    AdditiveDamped,
}

impl TrendType {
    /// Number of smoothing parameters plus initial states.
    fn num_params(self) -> usize {
        match self {
            TrendType::None => 2,
            TrendType::Additive => 4,
            TrendType::AdditiveDamped => 5,
        }
    }

    fn min_observations(self) -> usize {
        match self {
            TrendType::None => 2,
            _ => 4,
        }
    }
}

impl fmt::Display for TrendType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrendType::None => write!(f, "ETS(A,N,N)"),
            TrendType::Additive => write!(f, "ETS(A,A,N)"),
            TrendType::AdditiveDamped => write!(f, "ETS(A,Ad,N)"),
        }
    }
}

/// Smoothing parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Params {
    alpha: f64,
    beta: f64,
    phi: f64,
}

/// Exponential smoothing state space model.
#[derive(Debug, Clone)]
pub struct Ets {
    trend_type: TrendType,
    params: Option<Params>,
    level: Option<f64>,
    trend: Option<f64>,
    fitted: Option<Vec<f64>>,
    aic: Option<f64>,
    aicc: Option<f64>,
}

impl Ets {
    pub fn new(trend_type: TrendType) -> Self {
        Self {
            trend_type,
            params: None,
            level: None,
            trend: None,
            fitted: None,
            aic: None,
            aicc: None,
        }
    }

    pub fn trend_type(&self) -> TrendType {
        self.trend_type
    }

    pub fn alpha(&self) -> Option<f64> {
        self.params.map(|p| p.alpha)
    }

    /// Damping factor; 1.0 for undamped trends.
    pub fn phi(&self) -> Option<f64> {
        self.params.map(|p| p.phi)
    }

    pub fn aic(&self) -> Option<f64> {
        self.aic
    }

    pub fn aicc(&self) -> Option<f64> {
        self.aicc
    }

    fn initial_state(&self, values: &[f64]) -> (f64, f64) {
        match self.trend_type {
            TrendType::None => (values[0], 0.0),
            _ => (values[0], values[1] - values[0]),
        }
    }

    /// One-step predictions for every position and the final state.
    fn run(&self, values: &[f64], p: Params) -> (f64, f64, Vec<f64>) {
        let (mut level, mut trend) = self.initial_state(values);
        let mut one_step = Vec::with_capacity(values.len());
        one_step.push(f64::NAN);

        for &y in &values[1..] {
            let damped = p.phi * trend;
            one_step.push(level + damped);
            let prev = level;
            level = p.alpha * y + (1.0 - p.alpha) * (prev + damped);
            if self.trend_type != TrendType::None {
                trend = p.beta * (level - prev) + (1.0 - p.beta) * damped;
            }
        }
        (level, trend, one_step)
    }

    fn sse(&self, values: &[f64], p: Params) -> f64 {
        let (.., one_step) = self.run(values, p);
        residuals(values, &one_step).iter().map(|r| r * r).sum()
    }

    fn optimize(&self, values: &[f64]) -> Params {
        let config = NelderMeadConfig {
            max_iterations: 500,
            tolerance: 1e-8,
            ..Default::default()
        };
        let (lo, hi) = SMOOTHING_BOUNDS;
        match self.trend_type {
            TrendType::None => {
                let result = nelder_mead(
                    |x| self.sse(values, Params { alpha: x[0], beta: 0.0, phi: 1.0 }),
                    &[0.3],
                    Some(&[SMOOTHING_BOUNDS]),
                    config,
                );
                Params {
                    alpha: result.point[0].clamp(lo, hi),
                    beta: 0.0,
                    phi: 1.0,
                }
            }
            TrendType::Additive => {
                let result = nelder_mead(
                    |x| self.sse(values, Params { alpha: x[0], beta: x[1], phi: 1.0 }),
                    &[0.3, 0.1],
                    Some(&[SMOOTHING_BOUNDS; 2]),
                    config,
                );
                Params {
                    alpha: result.point[0].clamp(lo, hi),
                    beta: result.point[1].clamp(lo, hi),
                    phi: 1.0,
                }
            }
            TrendType::AdditiveDamped => {
                let result = nelder_mead(
                    |x| self.sse(values, Params { alpha: x[0], beta: x[1], phi: x[2] }),
                    &[0.3, 0.1, 0.9],
                    Some(&[SMOOTHING_BOUNDS, SMOOTHING_BOUNDS, DAMPING_BOUNDS]),
                    config,
                );
                Params {
                    alpha: result.point[0].clamp(lo, hi),
                    beta: result.point[1].clamp(lo, hi),
                    phi: result.point[2].clamp(DAMPING_BOUNDS.0, DAMPING_BOUNDS.1),
                }
            }
        }
    }

    /// phi + phi^2 + ... + phi^h.
    fn damped_sum(phi: f64, h: usize) -> f64 {
        if (phi - 1.0).abs() < 1e-10 {
            h as f64
        } else {
            phi * (1.0 - phi.powi(h as i32)) / (1.0 - phi)
        }
    }
}

impl Forecaster for Ets {
    fn fit(&mut self, series: &SeasonalSeries) -> Result<()> {
        let values = series.values();
        let needed = self.trend_type.min_observations();
        if values.len() < needed {
            return Err(ForecastError::InsufficientData {
                needed,
                got: values.len(),
            });
        }

        let params = self.optimize(values);
        let (level, trend, fitted) = self.run(values, params);
        if !level.is_finite() || !trend.is_finite() {
            return Err(ForecastError::ComputationError(format!(
                "{} state diverged",
                self.trend_type
            )));
        }

        // Gaussian likelihood of the one-step errors. The variance floor keeps
        // a perfect fit comparable instead of collapsing to -inf.
        let errors = residuals(values, &fitted);
        let n = errors.len() as f64;
        let variance = (errors.iter().map(|e| e * e).sum::<f64>() / n).max(1e-12);
        let k = self.trend_type.num_params() as f64;
        let ll = -0.5 * n * (1.0 + variance.ln() + (2.0 * PI).ln());
        self.aic = Some(-2.0 * ll + 2.0 * k);
        self.aicc = Some(-2.0 * ll + 2.0 * k * n / (n - k - 1.0).max(1.0));

        self.params = Some(params);
        self.level = Some(level);
        self.trend = Some(trend);
        self.fitted = Some(fitted);
        Ok(())
    }

    fn predict(&self, horizon: usize) -> Result<Forecast> {
        let level = self.level.ok_or(ForecastError::FitRequired)?;
        let trend = self.trend.ok_or(ForecastError::FitRequired)?;
        let phi = self.params.ok_or(ForecastError::FitRequired)?.phi;

        let predictions = (1..=horizon)
            .map(|h| match self.trend_type {
                TrendType::None => level,
                TrendType::Additive => level + h as f64 * trend,
                TrendType::AdditiveDamped => level + Self::damped_sum(phi, h) * trend,
            })
            .collect();
        Ok(Forecast::from_values(predictions))
    }

    fn fitted_values(&self) -> Option<&[f64]> {
        self.fitted.as_deref()
    }

    fn name(&self) -> &str {
        match self.trend_type {
            TrendType::None => "SES",
            TrendType::Additive => "Holt",
            TrendType::AdditiveDamped => "HoltDamped",
        }
    }
}
