//! Tabular and text output of a selection.

use super::select::{BestConfig, Selection};
use crate::error::{ForecastError, Result};
use crate::utils::metrics::calculate_metrics;
use chrono::NaiveDate;
use serde::Serialize;
use std::fmt::Write as _;
use std::io::Write;
use std::path::Path;

/// Status column of a report row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RowStatus {
    Ok,
    Unavailable,
    NoViableModel,
}

/// One line of the ranked or best-configuration table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRow {
    pub hotel: String,
    pub segment: String,
    pub seasonal: String,
    pub model: String,
    pub error: Option<f64>,
    pub status: RowStatus,
    pub rank: Option<usize>,
    pub reason: Option<String>,
}

#[derive(Debug, Serialize)]
struct ForecastRow {
    date: NaiveDate,
    actual: f64,
    forecast: f64,
}

/// Every job of every series, best first within a series.
pub fn ranked_rows(selection: &Selection) -> Vec<ReportRow> {
    let mut rows = Vec::new();
    for best in selection.best() {
        let key = best.key();
        for entry in selection.ranked(key).unwrap_or_default() {
            let available = entry.score.is_available();
            rows.push(ReportRow {
                hotel: key.hotel.clone(),
                segment: key.segment.clone(),
                seasonal: entry.seasonal.to_string(),
                model: entry.model.to_string(),
                error: entry.score.error(),
                status: if available {
                    RowStatus::Ok
                } else {
                    RowStatus::Unavailable
                },
                rank: available.then_some(entry.rank),
                reason: entry.score.reason().map(str::to_string),
            });
        }
    }
    rows
}

/// One row per series: its winner, or a no-viable-model marker.
pub fn best_rows(best: &[BestConfig]) -> Vec<ReportRow> {
    best.iter()
        .map(|config| {
            let key = config.key();
            match config {
                BestConfig::Found(winner) => ReportRow {
                    hotel: key.hotel.clone(),
                    segment: key.segment.clone(),
                    seasonal: winner.seasonal.to_string(),
                    model: winner.model.to_string(),
                    error: Some(winner.error),
                    status: RowStatus::Ok,
                    rank: Some(1),
                    reason: None,
                },
                BestConfig::NoViableModel { failures, .. } => ReportRow {
                    hotel: key.hotel.clone(),
                    segment: key.segment.clone(),
                    seasonal: String::new(),
                    model: String::new(),
                    error: None,
                    status: RowStatus::NoViableModel,
                    rank: None,
                    reason: Some(format!("{} jobs failed", failures.len())),
                },
            }
        })
        .collect()
}

/// Write rows as CSV with a header.
pub fn write_rows<W: Write>(writer: W, rows: &[ReportRow]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_ranked_csv(path: impl AsRef<Path>, rows: &[ReportRow]) -> Result<()> {
    write_rows(create(path.as_ref())?, rows)
}

pub fn write_best_csv(path: impl AsRef<Path>, best: &[BestConfig]) -> Result<()> {
    write_rows(create(path.as_ref())?, &best_rows(best))
}

/// Held-out dates, actuals and the winning forecast of one series.
pub fn write_forecast<W: Write>(writer: W, best: &BestConfig) -> Result<()> {
    let winner = best.winner().ok_or_else(|| {
        ForecastError::InvalidParameter(format!("no viable model for {}", best.key()))
    })?;
    let mut writer = csv::Writer::from_writer(writer);
    for ((date, actual), forecast) in winner
        .dates()
        .into_iter()
        .zip(&winner.actuals)
        .zip(winner.forecast.primary())
    {
        writer.serialize(ForecastRow {
            date,
            actual: *actual,
            forecast: *forecast,
        })?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_forecast_csv(path: impl AsRef<Path>, best: &BestConfig) -> Result<()> {
    write_forecast(create(path.as_ref())?, best)
}

fn create(path: &Path) -> Result<std::fs::File> {
    std::fs::File::create(path)
        .map_err(|err| ForecastError::Io(format!("{}: {err}", path.display())))
}

/// Human-readable summary, one line per series.
pub fn summary(selection: &Selection) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} series, {} with a viable model",
        selection.best().len(),
        selection.viable_count()
    );
    for best in selection.best() {
        match best {
            BestConfig::Found(winner) => {
                let _ = write!(
                    out,
                    "{}: {} x {}  MAE {:.3}",
                    winner.key, winner.model, winner.seasonal, winner.error
                );
                if let Some(range) = &winner.actual_range {
                    let _ = write!(
                        out,
                        "  (held-out min {:.0}, max {:.0}, mean {:.1})",
                        range.min, range.max, range.mean
                    );
                }
                if let Ok(metrics) = calculate_metrics(&winner.actuals, winner.forecast.primary()) {
                    let _ = write!(out, "  RMSE {:.3}", metrics.rmse);
                    if let Some(relative) = metrics.relative_mae {
                        let _ = write!(out, "  relative MAE {:.1}%", 100.0 * relative);
                    }
                }
                out.push('\n');
            }
            BestConfig::NoViableModel { key, failures } => {
                let _ = writeln!(out, "{key}: no viable model ({} jobs failed)", failures.len());
            }
        }
    }
    out
}
