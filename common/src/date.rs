// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
//! Calendar-date handling.
//!
//! `YYYY-MM-DD` is the wire format for every `date` field. Values carrying a
//! time-of-day (`2024-01-01T10:00:00Z`) are truncated to their date prefix, so
//! two values compare equal when their leading ten characters do. This only
//! agrees with local day boundaries if every writer uses the same timezone.
use std::fmt;

use chrono::{Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TrackerError;

/// Parses a calendar date, dropping any time-of-day component.
pub fn parse_calendar_date(input: &str) -> Result<NaiveDate, TrackerError> {
    let trimmed = input.trim();
    let day_part = trimmed
        .split_once(['T', ' '])
        .map_or(trimmed, |(day, _)| day);

    NaiveDate::parse_from_str(day_part, "%Y-%m-%d")
        .map_err(|_| TrackerError::Validation(format!("Malformed date: {input}")))
}

/// Parses an optional date, falling back to `today()` when absent.
pub fn parse_or_today(input: Option<&str>) -> Result<NaiveDate, TrackerError> {
    input.map_or_else(|| Ok(today()), parse_calendar_date)
}

/// The current calendar date in UTC.
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// A year-month bucket, displayed as `{year}-{zero-padded month}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct MonthKey {
    pub year: i32,
    pub month: u32,
}

impl MonthKey {
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:02}", self.year, self.month)
    }
}

impl From<MonthKey> for String {
    fn from(key: MonthKey) -> Self {
        key.to_string()
    }
}

impl TryFrom<String> for MonthKey {
    type Error = TrackerError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let malformed = || TrackerError::Validation(format!("Malformed month: {value}"));
        let (year, month) = value.split_once('-').ok_or_else(malformed)?;
        let year = year.parse::<i32>().map_err(|_| malformed())?;
        let month = month.parse::<u32>().map_err(|_| malformed())?;
        if !(1..=12).contains(&month) {
            return Err(malformed());
        }
        Ok(Self { year, month })
    }
}
