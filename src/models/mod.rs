//! Forecasting models and the registry of named fitters.

mod traits;

pub mod arima;
pub mod exponential;
pub mod registry;
pub mod stl_forecaster;

pub use registry::{ModelRegistry, ModelSpec};
pub use stl_forecaster::{StlForecaster, TrendModel};
pub use traits::{BoxedForecaster, Forecaster};
