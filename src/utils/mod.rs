//! Numerical utilities shared by the models and the grid.

pub mod metrics;
pub mod optimization;
pub mod stats;

pub use metrics::{calculate_metrics, mae, AccuracyMetrics};
pub use optimization::{nelder_mead, Minimum, NelderMeadConfig};
pub use stats::ValueRange;
