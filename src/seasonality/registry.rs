//! Seasonal transforms: named functions that annotate a raw sequence with
//! the periodicities a model should treat as repeating.

use crate::error::{ForecastError, Result, SpecKind};
use std::fmt;
use std::sync::Arc;

/// Days per week.
pub const WEEKLY: usize = 7;
/// Four weeks, the booking "month".
pub const MONTHLY: usize = 4 * WEEKLY;
/// Days per (non-leap) year.
pub const ANNUAL: usize = 365;

/// Values plus one or more declared seasonal periods.
///
/// The values are never altered by the annotation.
#[derive(Debug, Clone, PartialEq)]
pub struct SeasonalSeries {
    values: Vec<f64>,
    /// Ascending, deduplicated, never empty.
    periods: Vec<usize>,
}

impl SeasonalSeries {
    /// Annotate `values` with `periods`. Periods below 2 carry no
    /// seasonality and are dropped; if none remain the series is treated as
    /// having period 1 (non-seasonal).
    pub fn new(values: Vec<f64>, periods: &[usize]) -> Self {
        let mut periods: Vec<usize> = periods.iter().copied().filter(|&p| p >= 2).collect();
        periods.sort_unstable();
        periods.dedup();
        if periods.is_empty() {
            periods.push(1);
        }
        Self { values, periods }
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Declared periods, ascending.
    pub fn periods(&self) -> &[usize] {
        &self.periods
    }

    /// The period single-seasonality models use: the longest declared one.
    pub fn primary_period(&self) -> usize {
        self.periods.last().copied().unwrap_or(1)
    }

    pub fn is_multi_seasonal(&self) -> bool {
        self.periods.len() > 1
    }

    pub fn is_seasonal(&self) -> bool {
        self.primary_period() >= 2
    }

    /// Number of complete cycles of `period` in the values.
    pub fn complete_cycles(&self, period: usize) -> usize {
        if period == 0 {
            0
        } else {
            self.values.len() / period
        }
    }
}

type TransformFn = dyn Fn(&[f64]) -> SeasonalSeries + Send + Sync;

/// A named seasonal transform.
#[derive(Clone)]
pub struct SeasonalSpec {
    pub name: &'static str,
    transform: Arc<TransformFn>,
}

impl SeasonalSpec {
    pub fn new<F>(name: &'static str, transform: F) -> Self
    where
        F: Fn(&[f64]) -> SeasonalSeries + Send + Sync + 'static,
    {
        Self {
            name,
            transform: Arc::new(transform),
        }
    }

    /// Spec declaring a fixed set of periods.
    pub fn with_periods(name: &'static str, periods: &'static [usize]) -> Self {
        Self::new(name, move |values| SeasonalSeries::new(values.to_vec(), periods))
    }

    /// Apply the transform.
    pub fn apply(&self, values: &[f64]) -> SeasonalSeries {
        (self.transform)(values)
    }
}

impl fmt::Debug for SeasonalSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SeasonalSpec").field("name", &self.name).finish()
    }
}

/// Ordered, named collection of seasonal transforms.
///
/// Order is significant: it is the grid's enumeration order and so decides
/// ties during selection.
#[derive(Debug, Clone, Default)]
pub struct SeasonalRegistry {
    specs: Vec<SeasonalSpec>,
}

impl SeasonalRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// `weekly`, `monthly`, `weekly_monthly`, `annual`.
    pub fn standard() -> Self {
        let mut registry = Self::new();
        for spec in [
            SeasonalSpec::with_periods("weekly", &[WEEKLY]),
            SeasonalSpec::with_periods("monthly", &[MONTHLY]),
            SeasonalSpec::with_periods("weekly_monthly", &[WEEKLY, MONTHLY]),
            SeasonalSpec::with_periods("annual", &[ANNUAL]),
        ] {
            registry.specs.push(spec);
        }
        registry
    }

    /// Register a transform. Names must be unique.
    pub fn register(&mut self, spec: SeasonalSpec) -> Result<()> {
        if self.get(spec.name).is_some() {
            return Err(ForecastError::InvalidParameter(format!(
                "seasonal spec '{}' registered twice",
                spec.name
            )));
        }
        self.specs.push(spec);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&SeasonalSpec> {
        self.specs.iter().find(|s| s.name == name)
    }

    /// Restrict to `names`, in the order given.
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> Result<Self> {
        let mut selected = Self::new();
        for name in names {
            let name = name.as_ref();
            let spec = self.get(name).ok_or_else(|| ForecastError::UnknownSpec {
                kind: SpecKind::Seasonal,
                name: name.to_string(),
            })?;
            selected.register(spec.clone())?;
        }
        Ok(selected)
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.specs.iter().map(|s| s.name).collect()
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SeasonalSpec> {
        self.specs.iter()
    }

    /// Spec at grid position `index`.
    pub fn at(&self, index: usize) -> Option<&SeasonalSpec> {
        self.specs.get(index)
    }
}
