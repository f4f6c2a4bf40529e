//! Daily demand series keyed by hotel and market segment.

use crate::error::{ForecastError, Result};
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Identifier of a series: hotel identity plus market segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SeriesKey {
    pub hotel: String,
    pub segment: String,
}

impl SeriesKey {
    pub fn new(hotel: impl Into<String>, segment: impl Into<String>) -> Self {
        Self {
            hotel: hotel.into(),
            segment: segment.into(),
        }
    }

    /// Parse `"hotel/segment"`. The first `/` separates the two parts, so
    /// segments such as `Offline TA/TO` survive.
    pub fn parse(text: &str) -> Result<Self> {
        let (hotel, segment) = text.split_once('/').ok_or_else(|| {
            ForecastError::InvalidParameter(format!(
                "series key '{text}' must look like 'hotel/segment'"
            ))
        })?;
        let (hotel, segment) = (hotel.trim(), segment.trim());
        if hotel.is_empty() || segment.is_empty() {
            return Err(ForecastError::InvalidParameter(format!(
                "series key '{text}' has an empty part"
            )));
        }
        Ok(Self::new(hotel, segment))
    }
}

impl fmt::Display for SeriesKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} / {}", self.hotel, self.segment)
    }
}

/// A gap-free daily series starting at `start`.
///
/// Position `i` holds the value for `start + i` days, so timestamps are
/// strictly increasing with a one-day step by construction.
#[derive(Debug, Clone, PartialEq)]
pub struct DailySeries {
    key: SeriesKey,
    start: NaiveDate,
    values: Vec<f64>,
}

impl DailySeries {
    /// Create a series from contiguous daily values.
    pub fn new(key: SeriesKey, start: NaiveDate, values: Vec<f64>) -> Result<Self> {
        if values.is_empty() {
            return Err(ForecastError::EmptyData);
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::InvalidParameter(format!(
                "series {key} contains non-finite values"
            )));
        }
        Ok(Self { key, start, values })
    }

    /// Reindex sparse `(date, value)` observations onto every day from
    /// `start` to `end` inclusive, filling days without an observation
    /// with zero. Observations outside the range are rejected.
    pub fn padded(
        key: SeriesKey,
        observations: &BTreeMap<NaiveDate, f64>,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Self> {
        if end < start {
            return Err(ForecastError::InvalidParameter(format!(
                "calendar end {end} precedes start {start}"
            )));
        }
        if let Some((&first, _)) = observations.iter().next() {
            let last = *observations.keys().next_back().unwrap_or(&first);
            if first < start || last > end {
                return Err(ForecastError::InvalidParameter(format!(
                    "observations for {key} fall outside {start}..={end}"
                )));
            }
        }

        let len = calendar_len(start, end);
        let mut values = vec![0.0; len];
        for (date, &value) in observations {
            values[(*date - start).num_days() as usize] = value;
        }
        Self::new(key, start, values)
    }

    pub fn key(&self) -> &SeriesKey {
        &self.key
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    /// Last covered date.
    pub fn end(&self) -> NaiveDate {
        self.date_at(self.values.len() - 1)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Date of position `index`.
    pub fn date_at(&self, index: usize) -> NaiveDate {
        self.start + Duration::days(index as i64)
    }

    /// All dates, in order.
    pub fn dates(&self) -> Vec<NaiveDate> {
        (0..self.values.len()).map(|i| self.date_at(i)).collect()
    }

    /// Split into a training window and a held-out tail of `horizon` days.
    ///
    /// At least one training observation must remain.
    pub fn split(&self, horizon: usize) -> Result<SplitSeries> {
        if horizon == 0 {
            return Err(ForecastError::InvalidParameter(
                "evaluation horizon must be positive".to_string(),
            ));
        }
        let needed = horizon + 1;
        if self.values.len() < needed {
            return Err(ForecastError::InsufficientData {
                needed,
                got: self.values.len(),
            });
        }
        let cut = self.values.len() - horizon;
        Ok(SplitSeries {
            key: self.key.clone(),
            start: self.start,
            train: self.values[..cut].to_vec(),
            test: self.values[cut..].to_vec(),
        })
    }
}

/// A series divided into training observations and a held-out window.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitSeries {
    key: SeriesKey,
    start: NaiveDate,
    train: Vec<f64>,
    test: Vec<f64>,
}

impl SplitSeries {
    pub fn key(&self) -> &SeriesKey {
        &self.key
    }

    pub fn train(&self) -> &[f64] {
        &self.train
    }

    pub fn test(&self) -> &[f64] {
        &self.test
    }

    /// Length of the held-out window.
    pub fn horizon(&self) -> usize {
        self.test.len()
    }

    /// First date of the held-out window.
    pub fn test_start(&self) -> NaiveDate {
        self.start + Duration::days(self.train.len() as i64)
    }

    /// Dates of the held-out window.
    pub fn test_dates(&self) -> Vec<NaiveDate> {
        let first = self.test_start();
        (0..self.test.len())
            .map(|i| first + Duration::days(i as i64))
            .collect()
    }

    /// Rebuild the full series from both windows.
    pub fn rejoin(&self) -> Vec<f64> {
        let mut all = self.train.clone();
        all.extend_from_slice(&self.test);
        all
    }
}

/// Number of days from `start` to `end`, both inclusive.
pub fn calendar_len(start: NaiveDate, end: NaiveDate) -> usize {
    ((end - start).num_days() + 1).max(0) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn key() -> SeriesKey {
        SeriesKey::new("City Hotel", "Online TA")
    }

    #[test]
    fn key_parse_keeps_slash_in_segment() {
        let key = SeriesKey::parse("Resort Hotel/Offline TA/TO").unwrap();
        assert_eq!(key.hotel, "Resort Hotel");
        assert_eq!(key.segment, "Offline TA/TO");
        assert_eq!(key.to_string(), "Resort Hotel / Offline TA/TO");

        assert!(SeriesKey::parse("no separator").is_err());
        assert!(SeriesKey::parse("/Direct").is_err());
    }

    #[test]
    fn padded_fills_missing_days_with_zero() {
        let mut obs = BTreeMap::new();
        obs.insert(date(2016, 1, 2), 3.0);
        obs.insert(date(2016, 1, 5), 1.0);

        let series = DailySeries::padded(key(), &obs, date(2016, 1, 1), date(2016, 1, 6)).unwrap();

        assert_eq!(series.len(), 6);
        assert_eq!(series.values(), &[0.0, 3.0, 0.0, 0.0, 1.0, 0.0]);
        assert_eq!(series.start(), date(2016, 1, 1));
        assert_eq!(series.end(), date(2016, 1, 6));
    }

    #[test]
    fn padded_without_observations_is_all_zero() {
        let series = DailySeries::padded(
            key(),
            &BTreeMap::new(),
            date(2016, 2, 27),
            date(2016, 3, 1),
        )
        .unwrap();
        // 2016 is a leap year.
        assert_eq!(series.values(), &[0.0; 4]);
    }

    #[test]
    fn padded_rejects_out_of_range_observations() {
        let mut obs = BTreeMap::new();
        obs.insert(date(2017, 1, 1), 1.0);
        assert!(DailySeries::padded(key(), &obs, date(2016, 1, 1), date(2016, 12, 31)).is_err());
    }

    #[test]
    fn split_yields_fixed_holdout() {
        let series = DailySeries::new(key(), date(2016, 1, 1), (0..45).map(f64::from).collect())
            .unwrap();
        let split = series.split(30).unwrap();

        assert_eq!(split.train().len(), 15);
        assert_eq!(split.test().len(), 30);
        assert_eq!(split.test()[0], 15.0);
        assert_eq!(split.test_start(), date(2016, 1, 16));
        assert_eq!(split.test_dates().len(), 30);
        assert_eq!(split.rejoin(), series.values());
    }

    #[test]
    fn split_requires_one_training_point() {
        let series = DailySeries::new(key(), date(2016, 1, 1), vec![1.0; 30]).unwrap();
        assert_eq!(
            series.split(30).unwrap_err(),
            ForecastError::InsufficientData { needed: 31, got: 30 }
        );

        let series = DailySeries::new(key(), date(2016, 1, 1), vec![1.0; 31]).unwrap();
        assert_eq!(series.split(30).unwrap().train().len(), 1);
    }

    #[test]
    fn new_rejects_empty_and_non_finite() {
        assert_eq!(
            DailySeries::new(key(), date(2016, 1, 1), vec![]).unwrap_err(),
            ForecastError::EmptyData
        );
        assert!(DailySeries::new(key(), date(2016, 1, 1), vec![1.0, f64::NAN]).is_err());
    }
}
