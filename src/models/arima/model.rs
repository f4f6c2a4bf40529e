//! ARIMA with optional seasonal differencing, estimated by conditional
//! sum of squares.

use crate::core::Forecast;
use crate::error::{ForecastError, Result};
use crate::models::arima::diff::{difference, integrate, seasonal_difference, seasonal_integrate};
use crate::models::Forecaster;
use crate::seasonality::SeasonalSeries;
use crate::utils::optimization::{nelder_mead, NelderMeadConfig};
use std::f64::consts::PI;
use std::fmt;

/// Coefficient bound keeping the AR part stationary and the MA part
/// invertible for the orders searched here.
const COEFF_BOUND: f64 = 0.99;

/// Model order: ARIMA(p, d, q) with `D` seasonal differences at period `s`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArimaOrder {
    pub p: usize,
    pub d: usize,
    pub q: usize,
    /// Seasonal differencing order (0 or 1).
    pub seasonal_d: usize,
    /// Period of the seasonal difference; ignored when `seasonal_d == 0`.
    pub period: usize,
}

impl ArimaOrder {
    pub fn new(p: usize, d: usize, q: usize) -> Self {
        Self {
            p,
            d,
            q,
            seasonal_d: 0,
            period: 0,
        }
    }

    /// Add one seasonal difference at `period`.
    pub fn with_seasonal_difference(mut self, period: usize) -> Self {
        self.seasonal_d = 1;
        self.period = period;
        self
    }

    pub fn is_seasonal(&self) -> bool {
        self.seasonal_d > 0 && self.period > 1
    }

    /// AR + MA + intercept.
    pub fn num_params(&self) -> usize {
        self.p + self.q + 1
    }

    /// Observations consumed by differencing.
    fn lost_to_differencing(&self) -> usize {
        self.d + if self.is_seasonal() { self.period } else { 0 }
    }
}

impl fmt::Display for ArimaOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ARIMA({},{},{})", self.p, self.d, self.q)?;
        if self.is_seasonal() {
            write!(f, "(0,1,0)[{}]", self.period)?;
        }
        Ok(())
    }
}

/// ARIMA forecasting model.
#[derive(Debug, Clone)]
pub struct Arima {
    order: ArimaOrder,
    ar: Vec<f64>,
    ma: Vec<f64>,
    intercept: f64,
    /// Training values on the original scale.
    original: Option<Vec<f64>>,
    /// After the seasonal difference, before regular differencing.
    seasonally_differenced: Option<Vec<f64>>,
    /// Fully differenced series the ARMA part is fitted on.
    differenced: Option<Vec<f64>>,
    residuals: Option<Vec<f64>>,
    fitted: Option<Vec<f64>>,
    aic: Option<f64>,
}

impl Arima {
    pub fn new(order: ArimaOrder) -> Self {
        Self {
            order,
            ar: Vec::new(),
            ma: Vec::new(),
            intercept: 0.0,
            original: None,
            seasonally_differenced: None,
            differenced: None,
            residuals: None,
            fitted: None,
            aic: None,
        }
    }

    pub fn order(&self) -> ArimaOrder {
        self.order
    }

    pub fn ar_coefficients(&self) -> &[f64] {
        &self.ar
    }

    pub fn ma_coefficients(&self) -> &[f64] {
        &self.ma
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    pub fn aic(&self) -> Option<f64> {
        self.aic
    }

    /// One-step ARMA predictions and errors on the differenced scale.
    /// Positions before `max(p, q)` have no prediction and zero error.
    fn filter(w: &[f64], p: usize, q: usize, ar: &[f64], ma: &[f64], c: f64) -> (Vec<f64>, Vec<f64>) {
        let n = w.len();
        let start = p.max(q);
        let mut predictions = vec![f64::NAN; n];
        let mut errors = vec![0.0; n];
        for t in start..n {
            let mut pred = c;
            for (i, phi) in ar.iter().enumerate() {
                pred += phi * (w[t - 1 - i] - c);
            }
            for (i, theta) in ma.iter().enumerate() {
                pred += theta * errors[t - 1 - i];
            }
            predictions[t] = pred;
            errors[t] = w[t] - pred;
        }
        (predictions, errors)
    }

    fn css(w: &[f64], p: usize, q: usize, params: &[f64]) -> f64 {
        let (c, ar, ma) = (params[0], &params[1..1 + p], &params[1 + p..]);
        let (_, errors) = Self::filter(w, p, q, ar, ma, c);
        let css: f64 = errors.iter().map(|e| e * e).sum();
        if css.is_finite() {
            css
        } else {
            f64::INFINITY
        }
    }

    fn estimate(&mut self, w: &[f64]) {
        let (p, q) = (self.order.p, self.order.q);
        let mean = w.iter().sum::<f64>() / w.len() as f64;
        if p == 0 && q == 0 {
            self.intercept = mean;
            self.ar.clear();
            self.ma.clear();
            return;
        }

        let mut initial = vec![mean];
        initial.extend((0..p).map(|i| 0.1 / (i + 1) as f64));
        initial.extend((0..q).map(|i| 0.1 / (i + 1) as f64));

        let mut bounds = vec![(f64::NEG_INFINITY, f64::INFINITY)];
        bounds.extend(std::iter::repeat((-COEFF_BOUND, COEFF_BOUND)).take(p + q));

        let config = NelderMeadConfig {
            max_iterations: 500,
            tolerance: 1e-8,
            ..Default::default()
        };
        let result = nelder_mead(|x| Self::css(w, p, q, x), &initial, Some(&bounds), config);

        self.intercept = result.point[0];
        self.ar = result.point[1..1 + p].to_vec();
        self.ma = result.point[1 + p..].to_vec();
    }
}

impl Forecaster for Arima {
    fn fit(&mut self, series: &SeasonalSeries) -> Result<()> {
        let values = series.values();
        let order = self.order;
        let needed = order.lost_to_differencing() + order.p.max(order.q) + 2;
        if values.len() < needed {
            return Err(ForecastError::InsufficientData {
                needed,
                got: values.len(),
            });
        }

        let seasonal = if order.is_seasonal() {
            seasonal_difference(values, order.period)
        } else {
            values.to_vec()
        };
        let w = difference(&seasonal, order.d);

        self.estimate(&w);
        let (predictions, errors) = Self::filter(&w, order.p, order.q, &self.ar, &self.ma, self.intercept);

        let used = &errors[order.p.max(order.q)..];
        let n = used.len() as f64;
        let variance = used.iter().map(|e| e * e).sum::<f64>() / n;
        if !variance.is_finite() {
            return Err(ForecastError::ComputationError(format!(
                "{order} produced non-finite residuals"
            )));
        }
        let ll = -0.5 * n * (1.0 + variance.max(1e-12).ln() + (2.0 * PI).ln());
        self.aic = Some(-2.0 * ll + 2.0 * order.num_params() as f64);

        // Fitted values on the original scale: actual minus one-step error,
        // aligned to the end of the series.
        let offset = values.len() - w.len();
        let mut fitted = vec![f64::NAN; values.len()];
        for (t, pred) in predictions.iter().enumerate() {
            if pred.is_finite() {
                fitted[offset + t] = values[offset + t] - errors[t];
            }
        }

        self.original = Some(values.to_vec());
        self.seasonally_differenced = Some(seasonal);
        self.differenced = Some(w);
        self.residuals = Some(errors);
        self.fitted = Some(fitted);
        Ok(())
    }

    fn predict(&self, horizon: usize) -> Result<Forecast> {
        let original = self.original.as_ref().ok_or(ForecastError::FitRequired)?;
        let seasonal = self
            .seasonally_differenced
            .as_ref()
            .ok_or(ForecastError::FitRequired)?;
        let w = self.differenced.as_ref().ok_or(ForecastError::FitRequired)?;
        let residuals = self.residuals.as_ref().ok_or(ForecastError::FitRequired)?;

        let mut extended = w.clone();
        let mut errors = residuals.clone();
        for _ in 0..horizon {
            let t = extended.len();
            let mut pred = self.intercept;
            for (i, phi) in self.ar.iter().enumerate() {
                if t > i {
                    pred += phi * (extended[t - 1 - i] - self.intercept);
                }
            }
            for (i, theta) in self.ma.iter().enumerate() {
                if t > i {
                    pred += theta * errors[t - 1 - i];
                }
            }
            extended.push(pred);
            // Future shocks have zero expectation.
            errors.push(0.0);
        }

        let forecast = integrate(&extended[w.len()..], seasonal, self.order.d);
        let forecast = if self.order.is_seasonal() {
            seasonal_integrate(&forecast, original, self.order.period)
        } else {
            forecast
        };
        Ok(Forecast::from_values(forecast))
    }

    fn fitted_values(&self) -> Option<&[f64]> {
        self.fitted.as_deref()
    }

    fn name(&self) -> &str {
        "ARIMA"
    }
}
