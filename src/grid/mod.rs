//! Grid search over series, seasonal transforms and models.
//!
//! - [`CombinationGrid`]: the ordered cross product of jobs
//! - [`Evaluator`]: parallel fit, forecast and MAE per job
//! - [`Selection`]: lowest-error configuration per series
//! - [`report`]: CSV tables and a text summary

mod evaluate;
mod job;
pub mod report;
mod select;

pub use evaluate::{EvaluationResult, Evaluator, EvaluatorConfig, Score};
pub use job::{CombinationGrid, Job};
pub use report::{ReportRow, RowStatus};
pub use select::{BestConfig, RankedEntry, Selection, Winner};
