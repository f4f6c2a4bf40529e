//! Exponential smoothing models.
//!
//! - ETS with no, linear or damped trend
//! - AutoETS choosing among them
//! - Additive Holt-Winters

mod auto_ets;
mod ets;
mod holt_winters;

pub use auto_ets::{AutoEts, SelectionCriterion};
pub use ets::{Ets, TrendType};
pub use holt_winters::HoltWinters;
