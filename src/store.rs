//! Aggregation of booking events into aligned daily series.
//!
//! Every series in a store spans the same calendar: from the earliest to
//! the latest arrival date across all kept bookings, with days that saw no
//! booking for a key filled with zero.

use crate::core::{calendar_len, DailySeries, SeriesKey, SplitSeries};
use crate::error::{ForecastError, Result};
use crate::io::BookingEvent;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Allow-list over market segments.
///
/// A segment is split into words on whitespace and `/`; it is kept when any
/// word equals a pattern, ignoring case. An empty allow-list keeps everything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentFilter {
    patterns: Vec<String>,
}

impl SegmentFilter {
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            patterns: patterns
                .into_iter()
                .map(|p| p.as_ref().trim().to_lowercase())
                .filter(|p| !p.is_empty())
                .collect(),
        }
    }

    pub fn allow_all() -> Self {
        Self {
            patterns: Vec::new(),
        }
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    pub fn matches(&self, segment: &str) -> bool {
        if self.patterns.is_empty() {
            return true;
        }
        segment
            .split(|c: char| c.is_whitespace() || c == '/')
            .filter(|w| !w.is_empty())
            .any(|word| {
                let word = word.to_lowercase();
                self.patterns.iter().any(|p| *p == word)
            })
    }
}

impl Default for SegmentFilter {
    /// Travel agent and direct segments.
    fn default() -> Self {
        Self::new(["TA", "Direct"])
    }
}

/// Daily series sharing one calendar, ordered by key.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesStore {
    series: Vec<DailySeries>,
}

impl SeriesStore {
    /// Count bookings per key and arrival date and pad every key onto the
    /// global calendar.
    pub fn from_events(
        events: &[BookingEvent],
        filter: &SegmentFilter,
        include_canceled: bool,
    ) -> Result<Self> {
        let mut counts: BTreeMap<SeriesKey, BTreeMap<NaiveDate, f64>> = BTreeMap::new();
        let mut range: Option<(NaiveDate, NaiveDate)> = None;

        for event in events {
            if (event.canceled && !include_canceled) || !filter.matches(&event.segment) {
                continue;
            }
            let key = SeriesKey::new(event.hotel.as_str(), event.segment.as_str());
            *counts.entry(key).or_default().entry(event.arrival).or_insert(0.0) += 1.0;
            range = Some(match range {
                None => (event.arrival, event.arrival),
                Some((lo, hi)) => (lo.min(event.arrival), hi.max(event.arrival)),
            });
        }

        let (start, end) = range.ok_or(ForecastError::EmptyData)?;
        let series = counts
            .iter()
            .map(|(key, observations)| DailySeries::padded(key.clone(), observations, start, end))
            .collect::<Result<Vec<_>>>()?;

        info!(
            events = events.len(),
            series = series.len(),
            days = calendar_len(start, end),
            %start,
            %end,
            "built daily series"
        );
        Self::from_series(series)
    }

    /// Store from already aggregated series, which must all cover the same
    /// dates and have distinct keys.
    pub fn from_series(mut series: Vec<DailySeries>) -> Result<Self> {
        let first = series.first().ok_or(ForecastError::EmptyData)?;
        let (start, end) = (first.start(), first.end());

        for s in &series {
            if s.start() != start || s.end() != end {
                return Err(ForecastError::RangeMismatch {
                    key: s.key().to_string(),
                    expected: format!("{start}..={end}"),
                    got: format!("{}..={}", s.start(), s.end()),
                });
            }
        }

        series.sort_by(|a, b| a.key().cmp(b.key()));
        if let Some(pair) = series.windows(2).find(|w| w[0].key() == w[1].key()) {
            return Err(ForecastError::InvalidParameter(format!(
                "series {} appears twice",
                pair[0].key()
            )));
        }
        Ok(Self { series })
    }

    pub fn series(&self) -> &[DailySeries] {
        &self.series
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &SeriesKey> {
        self.series.iter().map(DailySeries::key)
    }

    pub fn get(&self, key: &SeriesKey) -> Option<&DailySeries> {
        self.series
            .binary_search_by(|s| s.key().cmp(key))
            .ok()
            .map(|i| &self.series[i])
    }

    /// First calendar day.
    pub fn start(&self) -> Option<NaiveDate> {
        self.series.first().map(DailySeries::start)
    }

    /// Last calendar day.
    pub fn end(&self) -> Option<NaiveDate> {
        self.series.first().map(DailySeries::end)
    }

    /// Days per series.
    pub fn days(&self) -> usize {
        self.series.first().map_or(0, DailySeries::len)
    }

    /// Split every series at `horizon` days from the end.
    pub fn split_all(&self, horizon: usize) -> Result<Vec<SplitSeries>> {
        let splits = self
            .series
            .iter()
            .map(|s| s.split(horizon))
            .collect::<Result<Vec<_>>>()?;
        debug!(series = splits.len(), horizon, "split series");
        Ok(splits)
    }
}
