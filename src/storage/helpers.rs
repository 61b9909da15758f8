//! Shared storage helper functions.
//!
//! Column encodings used by the SQL backends. Timestamps are stored as
//! fixed-width RFC3339 text in UTC with microsecond precision, so string
//! comparison in SQL orders them chronologically.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};

use crate::interfaces::{Result, StorageError};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Encode a timestamp for a `created_at`/`updated_at` column.
pub fn encode_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Decode a timestamp column.
pub fn decode_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|_| StorageError::InvalidTimestamp(raw.to_string()))
}

/// Encode a calendar date column.
pub fn encode_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Decode a nullable calendar date column.
pub fn decode_date(raw: Option<&str>) -> Result<Option<NaiveDate>> {
    raw.map(|raw| {
        NaiveDate::parse_from_str(raw, DATE_FORMAT)
            .map_err(|_| StorageError::InvalidDate(raw.to_string()))
    })
    .transpose()
}

/// Narrow a stored streak counter to `u32`.
pub fn decode_count(column: &'static str, value: i64) -> Result<u32> {
    u32::try_from(value).map_err(|_| StorageError::OutOfRange { column, value })
}
