//! Error types for the booking-forecast crate.

use std::fmt;
use thiserror::Error;

/// Result type alias for forecasting and pipeline operations.
pub type Result<T> = std::result::Result<T, ForecastError>;

/// Which registry an unknown name was looked up in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecKind {
    Seasonal,
    Model,
}

impl fmt::Display for SpecKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpecKind::Seasonal => write!(f, "seasonal spec"),
            SpecKind::Model => write!(f, "model spec"),
        }
    }
}

/// Broad class of an error, used to decide whether it aborts a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Bad or insufficient input data. Aborts before evaluation.
    Data,
    /// A single fit failed. Contained per job.
    Fit,
    /// Unknown names or invalid settings. Aborts before evaluation.
    Config,
    /// File system or parse failures at the boundary.
    Io,
}

/// Errors that can occur while building series, fitting models or running the grid.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ForecastError {
    /// Input data is empty.
    #[error("empty input data")]
    EmptyData,

    /// Insufficient data points for the operation.
    #[error("insufficient data: need at least {needed}, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// Invalid parameter value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Dimension mismatch between data structures.
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// A seasonal spec or model name is not registered.
    #[error("unknown {kind} '{name}'")]
    UnknownSpec { kind: SpecKind, name: String },

    /// A series does not cover the shared calendar.
    #[error("series {key} covers {got}, expected {expected}")]
    RangeMismatch {
        key: String,
        expected: String,
        got: String,
    },

    /// A booking row could not be interpreted.
    #[error("invalid record at line {line}: {reason}")]
    InvalidRecord { line: u64, reason: String },

    /// Model has not been fitted yet.
    #[error("model must be fitted before prediction")]
    FitRequired,

    /// Fitting did not finish within the configured budget.
    #[error("fit exceeded timeout of {millis} ms")]
    FitTimeout { millis: u64 },

    /// Computation error (e.g., numerical issues, degenerate input).
    #[error("computation error: {0}")]
    ComputationError(String),

    #[error("io error: {0}")]
    Io(String),

    #[error("csv error: {0}")]
    Csv(String),

    #[error("config error: {0}")]
    Config(String),
}

impl ForecastError {
    /// Classify the error.
    pub fn class(&self) -> ErrorClass {
        match self {
            ForecastError::EmptyData
            | ForecastError::RangeMismatch { .. }
            | ForecastError::InvalidRecord { .. } => ErrorClass::Data,
            ForecastError::InsufficientData { .. } | ForecastError::DimensionMismatch { .. } => {
                ErrorClass::Data
            }
            ForecastError::UnknownSpec { .. }
            | ForecastError::InvalidParameter(_)
            | ForecastError::Config(_) => ErrorClass::Config,
            ForecastError::FitRequired
            | ForecastError::FitTimeout { .. }
            | ForecastError::ComputationError(_) => ErrorClass::Fit,
            ForecastError::Io(_) | ForecastError::Csv(_) => ErrorClass::Io,
        }
    }
}

impl From<std::io::Error> for ForecastError {
    fn from(err: std::io::Error) -> Self {
        ForecastError::Io(err.to_string())
    }
}

impl From<csv::Error> for ForecastError {
    fn from(err: csv::Error) -> Self {
        ForecastError::Csv(err.to_string())
    }
}

impl From<serde_json::Error> for ForecastError {
    fn from(err: serde_json::Error) -> Self {
        ForecastError::Config(err.to_string())
    }
}
