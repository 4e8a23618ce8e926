//! Request date parsing
//!
//! Request bodies carry dates either as RFC 3339 timestamps or as bare
//! `YYYY-MM-DD` calendar dates.

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, Utc};

use super::{DomainError, MonthKey};

const CALENDAR_DATE_FORMAT: &str = "%Y-%m-%d";

/// Years a `YYYY-MM` month key can name
const MONTH_KEY_YEARS: std::ops::RangeInclusive<i32> = 0..=9999;

/// Parse a request date. RFC 3339 is tried first; a bare calendar date is
/// taken as midnight UTC.
pub fn parse_flexible_date(raw: &str) -> Result<DateTime<FixedOffset>, DomainError> {
    let raw = raw.trim();

    if let Ok(timestamp) = DateTime::parse_from_rfc3339(raw) {
        return Ok(timestamp);
    }

    NaiveDate::parse_from_str(raw, CALENDAR_DATE_FORMAT)
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|midnight| midnight.and_utc().fixed_offset())
        .ok_or_else(|| DomainError::InvalidDate(raw.to_string()))
}

/// Parse an optional date field of an update request.
///
/// Absent leaves the field alone (`None`), an empty string clears it
/// (`Some(None)`), anything else must parse.
pub fn parse_date_update(raw: Option<&str>) -> Result<Option<Option<DateTime<Utc>>>, DomainError> {
    match raw {
        None => Ok(None),
        Some(value) if value.trim().is_empty() => Ok(Some(None)),
        Some(value) => parse_flexible_date(value).map(|d| Some(Some(d.with_timezone(&Utc)))),
    }
}

/// The effective date of a ledger entry and the month bucket it lands in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryDate {
    pub at: DateTime<Utc>,
    pub month_key: MonthKey,
}

impl EntryDate {
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let date = parse_flexible_date(raw)?;
        if !MONTH_KEY_YEARS.contains(&date.year()) {
            return Err(DomainError::InvalidDate(raw.trim().to_string()));
        }
        Ok(Self {
            month_key: MonthKey::from_date(&date),
            at: date.with_timezone(&Utc),
        })
    }
}
