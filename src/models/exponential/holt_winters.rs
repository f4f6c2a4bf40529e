//! Additive Holt-Winters (triple exponential smoothing).

use crate::core::Forecast;
use crate::error::{ForecastError, Result};
use crate::models::Forecaster;
use crate::seasonality::SeasonalSeries;
use crate::utils::optimization::{nelder_mead, NelderMeadConfig};

const PARAM_BOUNDS: (f64, f64) = (0.0001, 0.9999);

/// Holt-Winters forecaster with additive seasonality.
///
/// The model equations:
/// - Level: `l_t = α(y_t - s_{t-m}) + (1-α)(l_{t-1} + b_{t-1})`
/// - Trend: `b_t = β(l_t - l_{t-1}) + (1-β)b_{t-1}`
/// - Seasonal: `s_t = γ(y_t - l_t) + (1-γ)s_{t-m}`
/// - Forecast: `ŷ_{t+h} = l_t + h*b_t + s_{t+h-m}`
///
/// Unless fixed with [`HoltWinters::with_period`], the seasonal period `m`
/// is the series' primary period, so a multi-seasonal annotation is fitted
/// at its longest cycle.
#[derive(Debug, Clone)]
pub struct HoltWinters {
    alpha: Option<f64>,
    beta: Option<f64>,
    gamma: Option<f64>,
    /// Fixed period; `None` takes it from the series at fit time.
    period: Option<usize>,
    optimize: bool,
    level: Option<f64>,
    trend: Option<f64>,
    seasonals: Option<Vec<f64>>,
    fitted: Option<Vec<f64>>,
    /// Period used by the last fit.
    fitted_period: usize,
    n: usize,
}

impl HoltWinters {
    /// Fixed smoothing parameters.
    pub fn new(alpha: f64, beta: f64, gamma: f64) -> Self {
        let (lo, hi) = PARAM_BOUNDS;
        Self {
            alpha: Some(alpha.clamp(lo, hi)),
            beta: Some(beta.clamp(lo, hi)),
            gamma: Some(gamma.clamp(lo, hi)),
            optimize: false,
            ..Self::auto()
        }
    }

    /// Smoothing parameters chosen by Nelder-Mead on one-step SSE.
    pub fn auto() -> Self {
        Self {
            alpha: None,
            beta: None,
            gamma: None,
            period: None,
            optimize: true,
            level: None,
            trend: None,
            seasonals: None,
            fitted: None,
            fitted_period: 0,
            n: 0,
        }
    }

    /// Override the period instead of reading it from the series.
    pub fn with_period(mut self, period: usize) -> Self {
        self.period = Some(period);
        self
    }

    pub fn alpha(&self) -> Option<f64> {
        self.alpha
    }

    pub fn beta(&self) -> Option<f64> {
        self.beta
    }

    pub fn gamma(&self) -> Option<f64> {
        self.gamma
    }

    /// Period of the last fit (0 before fitting).
    pub fn seasonal_period(&self) -> usize {
        self.fitted_period
    }

    pub fn seasonals(&self) -> Option<&[f64]> {
        self.seasonals.as_deref()
    }

    /// Level from the first cycle, trend from the average change between
    /// the first two cycles, seasonal indices centred to sum to zero.
    fn initialize_state(values: &[f64], period: usize) -> (f64, f64, Vec<f64>) {
        let m = period as f64;
        let level = values[..period].iter().sum::<f64>() / m;
        let trend = (0..period)
            .map(|i| (values[period + i] - values[i]) / m)
            .sum::<f64>()
            / m;

        let mut seasonals: Vec<f64> = values[..period].iter().map(|y| y - level).collect();
        let offset = seasonals.iter().sum::<f64>() / m;
        for s in &mut seasonals {
            *s -= offset;
        }
        (level, trend, seasonals)
    }

    /// Run the recursions from the end of the first cycle. Returns the final
    /// state and the one-step predictions for positions `period..`.
    fn smooth(
        values: &[f64],
        alpha: f64,
        beta: f64,
        gamma: f64,
        period: usize,
    ) -> (f64, f64, Vec<f64>, Vec<f64>) {
        let (mut level, mut trend, mut seasonals) = Self::initialize_state(values, period);
        let mut one_step = Vec::with_capacity(values.len() - period);

        for (t, &y) in values.iter().enumerate().skip(period) {
            let idx = t % period;
            let s = seasonals[idx];
            one_step.push(level + trend + s);

            let prev = level;
            level = alpha * (y - s) + (1.0 - alpha) * (prev + trend);
            trend = beta * (level - prev) + (1.0 - beta) * trend;
            seasonals[idx] = gamma * (y - level) + (1.0 - gamma) * s;
        }
        (level, trend, seasonals, one_step)
    }

    fn sse(values: &[f64], alpha: f64, beta: f64, gamma: f64, period: usize) -> f64 {
        let (.., one_step) = Self::smooth(values, alpha, beta, gamma, period);
        one_step
            .iter()
            .zip(&values[period..])
            .map(|(f, y)| (y - f).powi(2))
            .sum()
    }

    fn optimize_params(values: &[f64], period: usize) -> (f64, f64, f64) {
        let config = NelderMeadConfig {
            max_iterations: 1000,
            tolerance: 1e-8,
            ..Default::default()
        };
        let bounds = [PARAM_BOUNDS; 3];
        let result = nelder_mead(
            |p| Self::sse(values, p[0], p[1], p[2], period),
            &[0.3, 0.1, 0.1],
            Some(&bounds),
            config,
        );
        let (lo, hi) = PARAM_BOUNDS;
        (
            result.point[0].clamp(lo, hi),
            result.point[1].clamp(lo, hi),
            result.point[2].clamp(lo, hi),
        )
    }
}

impl Default for HoltWinters {
    fn default() -> Self {
        Self::auto()
    }
}

impl Forecaster for HoltWinters {
    fn fit(&mut self, series: &SeasonalSeries) -> Result<()> {
        let period = self.period.unwrap_or_else(|| series.primary_period());
        if period < 2 {
            return Err(ForecastError::InvalidParameter(
                "Holt-Winters needs a seasonal period of at least 2".to_string(),
            ));
        }
        let values = series.values();
        if values.len() < 2 * period {
            return Err(ForecastError::InsufficientData {
                needed: 2 * period,
                got: values.len(),
            });
        }

        if self.optimize {
            let (alpha, beta, gamma) = Self::optimize_params(values, period);
            self.alpha = Some(alpha);
            self.beta = Some(beta);
            self.gamma = Some(gamma);
        }
        let alpha = self.alpha.ok_or(ForecastError::FitRequired)?;
        let beta = self.beta.ok_or(ForecastError::FitRequired)?;
        let gamma = self.gamma.ok_or(ForecastError::FitRequired)?;

        let (level, trend, seasonals, one_step) = Self::smooth(values, alpha, beta, gamma, period);
        if !level.is_finite() || !trend.is_finite() {
            return Err(ForecastError::ComputationError(
                "Holt-Winters state diverged".to_string(),
            ));
        }

        // The first cycle only seeds the state.
        let mut fitted = vec![f64::NAN; period];
        fitted.extend(one_step);

        self.level = Some(level);
        self.trend = Some(trend);
        self.seasonals = Some(seasonals);
        self.fitted = Some(fitted);
        self.fitted_period = period;
        self.n = values.len();
        Ok(())
    }

    fn predict(&self, horizon: usize) -> Result<Forecast> {
        let level = self.level.ok_or(ForecastError::FitRequired)?;
        let trend = self.trend.ok_or(ForecastError::FitRequired)?;
        let seasonals = self.seasonals.as_ref().ok_or(ForecastError::FitRequired)?;
        let period = self.fitted_period;

        let predictions = (1..=horizon)
            .map(|h| level + h as f64 * trend + seasonals[(self.n + h - 1) % period])
            .collect();
        Ok(Forecast::from_values(predictions))
    }

    fn fitted_values(&self) -> Option<&[f64]> {
        self.fitted.as_deref()
    }

    fn name(&self) -> &str {
        "HoltWinters(additive)"
    }
}
