//! Named model fitters.

use crate::error::{ForecastError, Result, SpecKind};
use crate::models::arima::AutoArima;
use crate::models::exponential::HoltWinters;
use crate::models::stl_forecaster::StlForecaster;
use crate::models::{BoxedForecaster, Forecaster};
use crate::seasonality::SeasonalSeries;
use std::fmt;
use std::sync::Arc;

type FitFn = dyn Fn(&SeasonalSeries) -> Result<BoxedForecaster> + Send + Sync;

/// A named fit function: seasonal series in, fitted forecaster out.
///
/// # Example
///
/// ```
/// use booking_forecast::models::{Forecaster, ModelSpec};
/// use booking_forecast::models::exponential::HoltWinters;
/// use booking_forecast::seasonality::SeasonalSeries;
///
/// let spec = ModelSpec::from_factory("holt_winter", || Box::new(HoltWinters::auto()));
/// let values: Vec<f64> = (0..28).map(|i| (i % 7) as f64).collect();
/// let fitted = spec.fit(&SeasonalSeries::new(values, &[7])).unwrap();
/// assert_eq!(fitted.predict(7).unwrap().horizon(), 7);
/// ```
#[derive(Clone)]
pub struct ModelSpec {
    pub name: &'static str,
    fit: Arc<FitFn>,
}

impl ModelSpec {
    /// Spec from an arbitrary fit function.
    pub fn new<F>(name: &'static str, fit: F) -> Self
    where
        F: Fn(&SeasonalSeries) -> Result<BoxedForecaster> + Send + Sync + 'static,
    {
        Self {
            name,
            fit: Arc::new(fit),
        }
    }

    /// Spec that builds a fresh model and fits it.
    pub fn from_factory<F>(name: &'static str, factory: F) -> Self
    where
        F: Fn() -> BoxedForecaster + Send + Sync + 'static,
    {
        Self::new(name, move |series| {
            let mut model = factory();
            model.fit(series)?;
            Ok(model)
        })
    }

    /// Fit against `series`, producing an independent handle.
    pub fn fit(&self, series: &SeasonalSeries) -> Result<BoxedForecaster> {
        (self.fit)(series)
    }
}

impl fmt::Debug for ModelSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelSpec").field("name", &self.name).finish()
    }
}

/// Ordered collection of model specs.
#[derive(Debug, Clone, Default)]
pub struct ModelRegistry {
    models: Vec<ModelSpec>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// `holt_winter`, `arima`, `stl_ets`, `stl_arima`.
    pub fn standard() -> Self {
        let models = vec![
            ModelSpec::from_factory("holt_winter", || Box::new(HoltWinters::auto())),
            ModelSpec::from_factory("arima", || Box::new(AutoArima::new())),
            ModelSpec::from_factory("stl_ets", || Box::new(StlForecaster::ets())),
            ModelSpec::from_factory("stl_arima", || Box::new(StlForecaster::arima())),
        ];
        Self { models }
    }

    /// Register a spec. Names must be unique.
    pub fn register(&mut self, spec: ModelSpec) -> Result<()> {
        if self.get(spec.name).is_some() {
            return Err(ForecastError::InvalidParameter(format!(
                "model spec '{}' registered twice",
                spec.name
            )));
        }
        self.models.push(spec);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&ModelSpec> {
        self.models.iter().find(|m| m.name == name)
    }

    /// Restrict to `names`, in the order given.
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> Result<Self> {
        let mut selected = Self::new();
        for name in names {
            let name = name.as_ref();
            let spec = self.get(name).ok_or_else(|| ForecastError::UnknownSpec {
                kind: SpecKind::Model,
                name: name.to_string(),
            })?;
            selected.register(spec.clone())?;
        }
        Ok(selected)
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.models.iter().map(|m| m.name).collect()
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ModelSpec> {
        self.models.iter()
    }

    pub fn at(&self, index: usize) -> Option<&ModelSpec> {
        self.models.get(index)
    }
}
