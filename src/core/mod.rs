//! Core data structures: daily series, their train/test split, and forecasts.

mod forecast;
mod series;

pub use forecast::Forecast;
pub use series::{calendar_len, DailySeries, SeriesKey, SplitSeries};
