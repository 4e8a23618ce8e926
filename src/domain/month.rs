//! Month keys
//!
//! A month key identifies a per-user monthly bucket as `YYYY-MM`.

use std::fmt;

use chrono::{DateTime, Datelike, TimeZone};
use serde::{Serialize, Serializer};

use super::DomainError;

/// Validated `YYYY-MM` month key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MonthKey(String);

impl MonthKey {
    /// Parse a client-supplied month key.
    ///
    /// Exactly seven characters, a hyphen at position five, four year digits
    /// and a month between 01 and 12.
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let invalid = || DomainError::InvalidMonthKey(raw.to_string());

        let bytes = raw.as_bytes();
        if bytes.len() != 7 || bytes[4] != b'-' {
            return Err(invalid());
        }
        if !bytes[..4].iter().chain(&bytes[5..]).all(u8::is_ascii_digit) {
            return Err(invalid());
        }

        let month: u32 = raw[5..].parse().map_err(|_| invalid())?;
        if !(1..=12).contains(&month) {
            return Err(invalid());
        }

        Ok(Self(raw.to_string()))
    }

    /// Derive the month key of a timestamp in its own offset.
    pub fn from_date<Tz: TimeZone>(date: &DateTime<Tz>) -> Self {
        Self(format!("{:04}-{:02}", date.year(), date.month()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for MonthKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

/// Parse an optional `?month=` filter; blank means no filter.
pub fn parse_month_filter(raw: Option<&str>) -> Result<Option<MonthKey>, DomainError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => MonthKey::parse(value).map(Some),
    }
}
