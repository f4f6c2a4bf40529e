//! Seasonal annotation and decomposition.
//!
//! - Registry: named transforms attaching declared periods to a sequence
//! - STL: Seasonal-Trend decomposition using LOESS
//! - MSTL: decomposition over several periods at once

mod mstl;
pub mod registry;
mod stl;

pub use mstl::Mstl;
pub use registry::{SeasonalRegistry, SeasonalSeries, SeasonalSpec, ANNUAL, MONTHLY, WEEKLY};
pub use stl::{Decomposition, Stl};
