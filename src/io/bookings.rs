//! Hotel booking CSV ingestion.
//!
//! Only the columns needed to place a booking on the calendar are read;
//! any other columns in the file are ignored.

use crate::error::{ForecastError, Result};
use chrono::NaiveDate;
use serde::Deserialize;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::info;

/// One booking, reduced to what aggregation needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingEvent {
    pub hotel: String,
    pub segment: String,
    pub arrival: NaiveDate,
    pub canceled: bool,
}

#[derive(Debug, Deserialize)]
struct BookingRow {
    hotel: String,
    is_canceled: u8,
    arrival_date_year: i32,
    arrival_date_month: String,
    arrival_date_day_of_month: u32,
    market_segment: String,
}

impl BookingRow {
    fn into_event(self, line: u64) -> Result<BookingEvent> {
        let invalid = |reason: String| ForecastError::InvalidRecord { line, reason };

        let month = parse_month(&self.arrival_date_month)
            .ok_or_else(|| invalid(format!("unknown month '{}'", self.arrival_date_month)))?;
        let arrival =
            NaiveDate::from_ymd_opt(self.arrival_date_year, month, self.arrival_date_day_of_month)
                .ok_or_else(|| {
                    invalid(format!(
                        "no such date {}-{:02}-{:02}",
                        self.arrival_date_year, month, self.arrival_date_day_of_month
                    ))
                })?;
        let canceled = match self.is_canceled {
            0 => false,
            1 => true,
            other => return Err(invalid(format!("is_canceled must be 0 or 1, got {other}"))),
        };
        if self.hotel.is_empty() {
            return Err(invalid("empty hotel".to_string()));
        }

        Ok(BookingEvent {
            hotel: self.hotel,
            segment: self.market_segment,
            arrival,
            canceled,
        })
    }
}

const MONTHS: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

/// Month number from an English name (full or three-letter, any case) or
/// a number 1-12.
pub fn parse_month(text: &str) -> Option<u32> {
    let text = text.trim();
    if let Ok(n) = text.parse::<u32>() {
        return (1..=12).contains(&n).then_some(n);
    }
    let lower = text.to_ascii_lowercase();
    if lower.len() < 3 {
        return None;
    }
    MONTHS
        .iter()
        .position(|m| *m == lower || (lower.len() == 3 && m.starts_with(&lower)))
        .map(|i| i as u32 + 1)
}

/// Read booking events from CSV data with a header row.
pub fn read_bookings<R: Read>(reader: R) -> Result<Vec<BookingEvent>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut events = Vec::new();
    for (idx, row) in reader.deserialize::<BookingRow>().enumerate() {
        // Header is line 1.
        let fallback_line = idx as u64 + 2;
        let row = row.map_err(|err| ForecastError::InvalidRecord {
            line: err.position().map_or(fallback_line, |p| p.line()),
            reason: err.to_string(),
        })?;
        events.push(row.into_event(fallback_line)?);
    }
    Ok(events)
}

/// Read booking events from a CSV file.
pub fn read_bookings_file(path: impl AsRef<Path>) -> Result<Vec<BookingEvent>> {
    let path = path.as_ref();
    let file = File::open(path)
        .map_err(|err| ForecastError::Io(format!("{}: {err}", path.display())))?;
    let events = read_bookings(BufReader::new(file))?;
    info!(path = %path.display(), records = events.len(), "read booking records");
    Ok(events)
}
