//! # booking-forecast
//!
//! Daily hotel booking demand forecasting by grid search.
//!
//! Booking records are aggregated into one gap-free daily series per hotel
//! and market segment. Every series is then run through each combination of
//! seasonal transform (weekly, monthly, weekly+monthly, annual) and model
//! (Holt-Winters, AutoARIMA, STL+ETS, STL+ARIMA), scored by mean absolute
//! error on a held-out window, and the lowest-error configuration is kept.

#![allow(clippy::upper_case_acronyms)]
#![allow(clippy::needless_range_loop)]

pub mod config;
pub mod core;
pub mod error;
pub mod grid;
pub mod io;
pub mod models;
pub mod pipeline;
pub mod seasonality;
pub mod store;
pub mod utils;

pub use error::{ForecastError, Result};

pub mod prelude {
    pub use crate::config::PipelineConfig;
    pub use crate::core::{DailySeries, Forecast, SeriesKey, SplitSeries};
    pub use crate::error::{ForecastError, Result};
    pub use crate::grid::{BestConfig, CombinationGrid, Evaluator, EvaluatorConfig, Score, Selection};
    pub use crate::models::{Forecaster, ModelRegistry, ModelSpec};
    pub use crate::pipeline::{Pipeline, PipelineOutput};
    pub use crate::seasonality::{SeasonalRegistry, SeasonalSeries, SeasonalSpec};
    pub use crate::store::{SegmentFilter, SeriesStore};
    pub use crate::utils::mae;
}
