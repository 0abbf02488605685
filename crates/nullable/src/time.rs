//! Timestamp payload.

use std::str;

use bson::Bson;
use chrono::{DateTime, Datelike, Days, NaiveDate, NaiveDateTime, NaiveTime, Utc, Weekday};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};

use crate::{
    de::DecodeOptions,
    error::DecodeError,
    nullable::Nullable,
    payload::{Payload, decode_with_serde},
    schema::Dialect,
    value::{BasicTypes, Value},
};

/// Formats with an explicit UTC offset, tried after RFC 3339 and RFC 2822.
const ZONED_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%d %H:%M:%S%.f%z"];
/// Zone-less formats, interpreted as UTC.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%Y%m%d"];

/// Leniently parses a timestamp.
///
/// Accepted formats are RFC 3339, RFC 2822, `YYYY-MM-DD HH:MM:SS[.fff][±HH:MM]` (also with `T` or `/` separators)
/// and plain dates (`YYYY-MM-DD`, `YYYY/MM/DD`, `YYYYMMDD`). Timestamps without an offset are interpreted as UTC,
/// and dates as midnight UTC.
///
/// # Errors
///
/// Returns an "invalid date string" error if none of the formats match.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, DecodeError> {
    let raw = raw.trim();
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(raw) {
        return Ok(timestamp.to_utc());
    }
    if let Ok(timestamp) = DateTime::parse_from_rfc2822(raw) {
        return Ok(timestamp.to_utc());
    }

    let zoned = ZONED_FORMATS
        .iter()
        .find_map(|format| DateTime::parse_from_str(raw, format).ok());
    if let Some(timestamp) = zoned {
        return Ok(timestamp.to_utc());
    }
    let naive = NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok());
    if let Some(timestamp) = naive {
        return Ok(timestamp.and_utc());
    }
    let date = DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(raw, format).ok());
    if let Some(date) = date {
        return Ok(date.and_time(NaiveTime::MIN).and_utc());
    }
    Err(DecodeError::invalid_date(raw))
}

impl Payload for DateTime<Utc> {
    const EXPECTING: BasicTypes = BasicTypes::STRING;
    const DATA_TYPE: &'static str = "time";

    fn decode(value: &Value, options: &DecodeOptions) -> Result<Self, DecodeError> {
        let raw: String = decode_with_serde(value, Self::EXPECTING, options)?;
        parse_timestamp(&raw)
    }

    fn column_type(dialect: Dialect) -> &'static str {
        match dialect {
            Dialect::Sqlite => "DATETIME",
            Dialect::Mysql => "DATETIME(3)",
            Dialect::Postgres => "TIMESTAMPTZ",
        }
    }

    /// Encodes the timestamp as a BSON date-time (with millisecond precision).
    fn to_bson(&self) -> Result<Bson, bson::ser::Error> {
        Ok(Bson::DateTime(bson::DateTime::from_millis(
            self.timestamp_millis(),
        )))
    }

    fn to_sql_output(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        ToSql::to_sql(self)
    }

    /// Reads text timestamps (falling back to lenient parsing) and integer Unix timestamps in seconds.
    fn from_sql_value(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value {
            ValueRef::Integer(secs) => {
                DateTime::from_timestamp(secs, 0).ok_or(FromSqlError::OutOfRange(secs))
            }
            ValueRef::Text(bytes) => {
                if let Ok(timestamp) = <Self as FromSql>::column_result(value) {
                    return Ok(timestamp);
                }
                let raw = str::from_utf8(bytes).map_err(|err| FromSqlError::Other(Box::new(err)))?;
                parse_timestamp(raw).map_err(|err| FromSqlError::Other(Box::new(err)))
            }
            _ => Err(FromSqlError::InvalidType),
        }
    }
}

/// Calendar view of a timestamp, providing formatting and day-boundary helpers.
///
/// All operations use UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Calendar(DateTime<Utc>);

impl Calendar {
    /// Wraps the specified timestamp.
    pub const fn new(timestamp: DateTime<Utc>) -> Self {
        Self(timestamp)
    }

    /// Returns the wrapped timestamp.
    pub const fn timestamp(self) -> DateTime<Utc> {
        self.0
    }

    /// Formats the date as `YYYY-MM-DD`.
    pub fn to_date_string(self) -> String {
        self.0.format("%Y-%m-%d").to_string()
    }

    /// Formats the time of day as `HH:MM:SS`.
    pub fn to_time_string(self) -> String {
        self.0.format("%H:%M:%S").to_string()
    }

    /// Formats the timestamp as `YYYY-MM-DD HH:MM:SS`.
    pub fn to_datetime_string(self) -> String {
        self.0.format("%Y-%m-%d %H:%M:%S").to_string()
    }

    /// Returns midnight at the start of the day.
    #[must_use]
    pub fn start_of_day(self) -> Self {
        Self(self.0.date_naive().and_time(NaiveTime::MIN).and_utc())
    }

    /// Returns the start of the next day. Saturates at the maximum supported date.
    #[must_use]
    pub fn start_of_next_day(self) -> Self {
        let start = self.start_of_day().0;
        Self(start.checked_add_days(Days::new(1)).unwrap_or(start))
    }

    /// Checks whether the timestamp falls on Saturday or Sunday.
    pub fn is_weekend(self) -> bool {
        matches!(self.0.weekday(), Weekday::Sat | Weekday::Sun)
    }

    /// Returns the number of whole days from `self` to `other` (negative if `other` is earlier).
    pub fn days_until(self, other: Self) -> i64 {
        (other.0 - self.0).num_days()
    }
}

impl From<DateTime<Utc>> for Calendar {
    fn from(timestamp: DateTime<Utc>) -> Self {
        Self(timestamp)
    }
}

impl Nullable<DateTime<Utc>> {
    /// Returns the calendar view of the timestamp if the wrapper is valid.
    pub fn calendar(&self) -> Option<Calendar> {
        self.as_option().copied().map(Calendar)
    }
}
