//! ARIMA models.
//!
//! - ARIMA(p, d, q) with an optional seasonal difference
//! - AutoArima for automatic order selection

mod auto_arima;
mod diff;
mod model;

pub use auto_arima::{AutoArima, AutoArimaConfig};
pub use diff::{difference, integrate, seasonal_difference, seasonal_integrate};
pub use model::{Arima, ArimaOrder};
