//! Relational driver codec based on [`rusqlite`] value conversions.
//!
//! SQL has a single null marker, so absent and null wrappers are both stored as `NULL`, and `NULL`
//! is always read back as a present, null wrapper.

use rusqlite::{
    ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, Value as SqlValue, ValueRef},
};
use serde::Serialize;

use crate::{de::DecodeOptions, nullable::Nullable, payload::Payload, value::Value};

impl<T: Payload> ToSql for Nullable<T> {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        match self.as_option() {
            Some(data) if !data.is_empty_payload() => data.to_sql_output(),
            _ => Ok(ToSqlOutput::Owned(SqlValue::Null)),
        }
    }
}

impl<T: Payload> FromSql for Nullable<T> {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        if matches!(value, ValueRef::Null) {
            return Ok(Self::null());
        }
        let data = T::from_sql_value(value)?;
        Ok(if data.is_empty_payload() {
            Self::null()
        } else {
            Self::new(data)
        })
    }
}

/// Stores a payload as JSON text.
pub(crate) fn json_to_sql<T: Serialize>(data: &T) -> rusqlite::Result<ToSqlOutput<'_>> {
    let json = serde_json::to_string(data)
        .map_err(|err| rusqlite::Error::ToSqlConversionFailure(Box::new(err)))?;
    Ok(ToSqlOutput::Owned(SqlValue::Text(json)))
}

/// Reads a payload stored as JSON text (or a JSON blob).
pub(crate) fn json_from_sql<T: Payload>(value: ValueRef<'_>) -> FromSqlResult<T> {
    let (ValueRef::Text(bytes) | ValueRef::Blob(bytes)) = value else {
        return Err(FromSqlError::InvalidType);
    };
    let value: Value =
        serde_json::from_slice(bytes).map_err(|err| FromSqlError::Other(Box::new(err)))?;
    T::decode(&value, &DecodeOptions::default()).map_err(|err| FromSqlError::Other(Box::new(err)))
}
