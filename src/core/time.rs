//! Time-of-day and calendar date parsing
//!
//! [`TimeOfDay`] is a validated 24-hour `hh:mm` value used for location opening
//! hours. [`DateValue`] is the date input accepted by release operations: either
//! an already-typed [`NaiveDate`] or text that still has to be parsed.

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Errors produced while parsing a time of day
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimeOfDayError {
    #[error("'{0}' is not in hh:mm format")]
    InvalidFormat(String),

    #[error("Invalid hours passed: {0}")]
    InvalidHour(u64),

    #[error("Invalid minutes passed: {0}")]
    InvalidMinute(u64),
}

impl TimeOfDayError {
    pub fn error_code(&self) -> &'static str {
        match self {
            TimeOfDayError::InvalidFormat(_) => "INVALID_FORMAT",
            TimeOfDayError::InvalidHour(_) => "INVALID_HOUR",
            TimeOfDayError::InvalidMinute(_) => "INVALID_MINUTE",
        }
    }
}

/// A 24-hour time of day, ordered by (hour, minute)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeOfDay {
    hour: u8,
    minute: u8,
}

impl TimeOfDay {
    /// Parse an `h:m` string, normalizing it to zero-padded `hh:mm`
    ///
    /// Both components must be decimal numbers; surrounding whitespace is ignored.
    pub fn parse(input: &str) -> Result<Self, TimeOfDayError> {
        let invalid = || TimeOfDayError::InvalidFormat(input.to_string());

        let parts: Vec<&str> = input.split(':').map(str::trim).collect();
        let [hours, minutes] = parts.as_slice() else {
            return Err(invalid());
        };

        let hour = parse_component(hours).ok_or_else(invalid)?;
        let minute = parse_component(minutes).ok_or_else(invalid)?;

        if hour > 23 {
            return Err(TimeOfDayError::InvalidHour(hour));
        }
        if minute > 59 {
            return Err(TimeOfDayError::InvalidMinute(minute));
        }

        Ok(Self {
            hour: hour as u8,
            minute: minute as u8,
        })
    }

    pub fn hour(&self) -> u8 {
        self.hour
    }

    pub fn minute(&self) -> u8 {
        self.minute
    }

    /// Strict ordering: `true` only if `self` is earlier than `other`
    pub fn is_before(&self, other: &TimeOfDay) -> bool {
        self < other
    }
}

/// Digits-only component; values too large for `u64` saturate so they still
/// fail the range check rather than the format check
fn parse_component(s: &str) -> Option<u64> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(s.parse().unwrap_or(u64::MAX))
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl FromStr for TimeOfDay {
    type Err = TimeOfDayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for TimeOfDay {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TimeOfDay {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        TimeOfDay::parse(&raw).map_err(serde::de::Error::custom)
    }
}

// =============================================================================
// Dates
// =============================================================================

/// A date supplied to a release operation
///
/// JSON strings in `YYYY-MM-DD` form decode straight to [`DateValue::Date`];
/// anything else is kept as text and parsed by [`DateValue::resolve`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DateValue {
    Date(NaiveDate),
    Text(String),
}

impl DateValue {
    /// Resolve to a calendar date
    ///
    /// Accepts `YYYY-MM-DD`, `d/m/yyyy` and RFC 3339 timestamps.
    pub fn resolve(&self) -> Option<NaiveDate> {
        match self {
            DateValue::Date(date) => Some(*date),
            DateValue::Text(text) => parse_date(text),
        }
    }
}

impl From<NaiveDate> for DateValue {
    fn from(date: NaiveDate) -> Self {
        DateValue::Date(date)
    }
}

impl From<&str> for DateValue {
    fn from(text: &str) -> Self {
        DateValue::Text(text.to_string())
    }
}

impl fmt::Display for DateValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DateValue::Date(date) => write!(f, "{}", date),
            DateValue::Text(text) => write!(f, "{}", text),
        }
    }
}

fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(text, "%d/%m/%Y"))
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(text)
                .ok()
                .map(|dt| dt.date_naive())
        })
}

/// Format a date as `d/m/yyyy` without zero padding
pub fn format_date(date: NaiveDate) -> String {
    date.format("%-d/%-m/%Y").to_string()
}
