//! Run configuration.

use crate::error::{ForecastError, Result};
use crate::grid::EvaluatorConfig;
use crate::models::ModelRegistry;
use crate::seasonality::SeasonalRegistry;
use crate::store::SegmentFilter;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Settings for one pipeline run. Missing JSON fields take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Booking CSV to read.
    pub input: Option<PathBuf>,
    /// Held-out window in days.
    pub horizon: usize,
    /// Market segment allow-list; empty keeps every segment.
    pub segments: Vec<String>,
    pub include_canceled: bool,
    /// Seasonal transforms to try, by name.
    pub seasonal: Vec<String>,
    /// Models to try, by name.
    pub models: Vec<String>,
    pub fit_timeout_secs: Option<f64>,
    pub threads: Option<usize>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input: None,
            horizon: 30,
            segments: vec!["TA".to_string(), "Direct".to_string()],
            include_canceled: false,
            seasonal: names(SeasonalRegistry::standard().names()),
            models: names(ModelRegistry::standard().names()),
            fit_timeout_secs: None,
            threads: None,
        }
    }
}

fn names(names: Vec<&'static str>) -> Vec<String> {
    names.into_iter().map(str::to_string).collect()
}

impl PipelineConfig {
    /// Load from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|err| ForecastError::Io(format!("{}: {err}", path.display())))?;
        serde_json::from_reader(BufReader::new(file))
            .map_err(|err| ForecastError::Config(format!("{}: {err}", path.display())))
    }

    /// Check settings and resolve names against the standard registries.
    pub fn validate(&self) -> Result<(SeasonalRegistry, ModelRegistry)> {
        if self.horizon == 0 {
            return Err(ForecastError::InvalidParameter(
                "horizon must be positive".to_string(),
            ));
        }
        if self.seasonal.is_empty() {
            return Err(ForecastError::InvalidParameter(
                "no seasonal transforms selected".to_string(),
            ));
        }
        if self.models.is_empty() {
            return Err(ForecastError::InvalidParameter(
                "no models selected".to_string(),
            ));
        }
        if self.threads == Some(0) {
            return Err(ForecastError::InvalidParameter(
                "threads must be positive".to_string(),
            ));
        }
        self.fit_timeout()?;

        let seasonal = SeasonalRegistry::standard().select(&self.seasonal)?;
        let models = ModelRegistry::standard().select(&self.models)?;
        Ok((seasonal, models))
    }

    pub fn segment_filter(&self) -> SegmentFilter {
        SegmentFilter::new(&self.segments)
    }

    pub fn evaluator_config(&self) -> Result<EvaluatorConfig> {
        Ok(EvaluatorConfig {
            horizon: self.horizon,
            fit_timeout: self.fit_timeout()?,
            threads: self.threads,
        })
    }

    /// Must be positive and fit in a `Duration`.
    fn fit_timeout(&self) -> Result<Option<Duration>> {
        self.fit_timeout_secs
            .map(|secs| {
                Duration::try_from_secs_f64(secs)
                    .ok()
                    .filter(|timeout| !timeout.is_zero())
                    .ok_or_else(|| {
                        ForecastError::InvalidParameter(format!(
                            "fit timeout must be a positive number of seconds, got {secs}"
                        ))
                    })
            })
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SpecKind;
    use std::io::Write;

    #[test]
    fn defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.horizon, 30);
        assert!(!config.include_canceled);
        assert_eq!(config.seasonal, vec!["weekly", "monthly", "weekly_monthly", "annual"]);
        assert_eq!(config.models, vec!["holt_winter", "arima", "stl_ets", "stl_arima"]);

        let (seasonal, models) = config.validate().unwrap();
        assert_eq!(seasonal.len(), 4);
        assert_eq!(models.len(), 4);
        assert!(config.segment_filter().matches("Online TA"));
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"horizon": 14, "models": ["arima"], "fit_timeout_secs": 2.5}}"#).unwrap();

        let config = PipelineConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.horizon, 14);
        assert_eq!(config.models, vec!["arima"]);
        assert_eq!(config.seasonal.len(), 4);
        assert_eq!(
            config.evaluator_config().unwrap().fit_timeout,
            Some(Duration::from_millis(2500))
        );
    }

    #[test]
    fn unknown_field_is_config_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"horizn": 14}}"#).unwrap();
        assert!(matches!(
            PipelineConfig::from_json_file(file.path()),
            Err(ForecastError::Config(_))
        ));
    }

    #[test]
    fn validation_rejects_bad_settings() {
        let config = PipelineConfig {
            horizon: 0,
            ..PipelineConfig::default()
        };
        assert!(config.validate().is_err());

        let config = PipelineConfig {
            models: Vec::new(),
            ..PipelineConfig::default()
        };
        assert!(config.validate().is_err());

        let config = PipelineConfig {
            seasonal: vec!["weekly".to_string(), "hourly".to_string()],
            ..PipelineConfig::default()
        };
        assert_eq!(
            config.validate().unwrap_err(),
            ForecastError::UnknownSpec {
                kind: SpecKind::Seasonal,
                name: "hourly".to_string()
            }
        );

        let config = PipelineConfig {
            fit_timeout_secs: Some(-1.0),
            ..PipelineConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn timeout_must_fit_a_duration() {
        for secs in [1e20, f64::INFINITY, f64::NAN, 0.0, 1e-12] {
            let config = PipelineConfig {
                fit_timeout_secs: Some(secs),
                ..PipelineConfig::default()
            };
            assert!(
                matches!(config.validate(), Err(ForecastError::InvalidParameter(_))),
                "{secs} accepted"
            );
            assert!(config.evaluator_config().is_err());
        }

        let config = PipelineConfig {
            fit_timeout_secs: Some(86_400.0),
            ..PipelineConfig::default()
        };
        assert!(config.validate().is_ok());
        assert_eq!(
            config.evaluator_config().unwrap().fit_timeout,
            Some(Duration::from_secs(86_400))
        );
    }
}
