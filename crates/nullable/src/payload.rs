//! Payload types for [`Nullable`](crate::Nullable) wrappers.

use rusqlite::types::{FromSql, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Serialize, de::DeserializeOwned};

use crate::{
    codec::{json_from_sql, json_to_sql},
    de::{DecodeOptions, ValueDeserializer},
    error::DecodeError,
    schema::Dialect,
    value::{BasicTypes, Value},
};

/// Policy for input that is well-formed for the codec, but cannot be converted into the payload type
/// (e.g., a JSON string where a number is expected).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OnMismatch {
    /// Mark the wrapper as null and continue. This avoids rejecting a whole document because of
    /// a single optional field, at the cost of losing the input silently. Absorbed errors are logged
    /// on the `WARN` level.
    Absorb,
    /// Propagate the error to the caller.
    Propagate,
}

/// Type that can be wrapped into a [`Nullable`](crate::Nullable).
///
/// All methods have reasonable defaults for structured user-defined types: values are decoded via
/// `serde`, stored in SQL as JSON text, and conversion errors are propagated. Thus, using a custom type
/// is usually a matter of a single line:
///
/// ```
/// use nullable::{Payload, Type};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
/// struct Address {
///     city: String,
///     zip: String,
/// }
///
/// impl Payload for Address {}
///
/// let address = Type::<Address>::from_json(br#"{ "city": "Denpasar", "zip": "80113" }"#)?;
/// assert_eq!(address.as_option().unwrap().city, "Denpasar");
/// # anyhow::Ok(())
/// ```
///
/// # Implementations
///
/// - `bool`, `i64`, `f64` and [`String`] absorb conversion errors on JSON / BSON inputs.
///   An empty `String` decodes to a null wrapper.
/// - `Vec<String>` propagates conversion errors; an empty array decodes to a null wrapper.
/// - [`DateTime<Utc>`](chrono::DateTime) is parsed leniently from strings; see [`Time`](crate::Time).
/// - Geometry types: [`GeomPoint`](crate::GeomPoint), [`GeomPolygon`](crate::GeomPolygon)
///   and [`GeomMultiPolygon`](crate::GeomMultiPolygon).
pub trait Payload: Serialize + DeserializeOwned + Default + 'static {
    /// Basic types the payload can be decoded from.
    const EXPECTING: BasicTypes = BasicTypes::ANY;
    /// Handling of conversion errors.
    const ON_MISMATCH: OnMismatch = OnMismatch::Propagate;
    /// Generic data type reported to ORM layers.
    const DATA_TYPE: &'static str = "json";

    /// Decodes the payload from a non-null value.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be converted into the payload type.
    fn decode(value: &Value, options: &DecodeOptions) -> Result<Self, DecodeError> {
        decode_with_serde(value, Self::EXPECTING, options)
    }

    /// Checks whether a successfully decoded payload is nevertheless considered empty, which makes
    /// the enclosing wrapper null.
    fn is_empty_payload(&self) -> bool {
        false
    }

    /// Returns the column type for the specified SQL dialect.
    fn column_type(dialect: Dialect) -> &'static str {
        match dialect {
            Dialect::Sqlite | Dialect::Mysql => "JSON",
            Dialect::Postgres => "JSONB",
        }
    }

    /// Converts the payload into a BSON value.
    ///
    /// # Errors
    ///
    /// Propagates serialization errors.
    fn to_bson(&self) -> Result<bson::Bson, bson::ser::Error> {
        bson::to_bson(self)
    }

    /// Converts the payload into a SQL driver value.
    ///
    /// # Errors
    ///
    /// Propagates serialization errors.
    fn to_sql_output(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        json_to_sql(self)
    }

    /// Converts a non-null SQL driver value into the payload.
    ///
    /// # Errors
    ///
    /// Returns an error if the value has an unexpected type or cannot be parsed.
    fn from_sql_value(value: ValueRef<'_>) -> FromSqlResult<Self> {
        json_from_sql(value)
    }
}

/// Decodes a value via `serde`, checking that it has one of the `expecting` basic types first.
pub(crate) fn decode_with_serde<T: DeserializeOwned>(
    value: &Value,
    expecting: BasicTypes,
    options: &DecodeOptions,
) -> Result<T, DecodeError> {
    let deserializer = ValueDeserializer::new(value, options);
    let type_matches = value.is_supported_by(expecting)
        || (options.coerce_strings && matches!(value, Value::String(_)));
    if !type_matches {
        return Err(deserializer.invalid_type(&expecting.to_string()));
    }
    T::deserialize(deserializer)
}

macro_rules! impl_scalar_payload {
    ($($ty:ty => $expecting:ident, $data_type:literal, [$sqlite:literal, $mysql:literal, $postgres:literal];)+) => {
        $(
        impl Payload for $ty {
            const EXPECTING: BasicTypes = BasicTypes::$expecting;
            const ON_MISMATCH: OnMismatch = OnMismatch::Absorb;
            const DATA_TYPE: &'static str = $data_type;

            fn column_type(dialect: Dialect) -> &'static str {
                match dialect {
                    Dialect::Sqlite => $sqlite,
                    Dialect::Mysql => $mysql,
                    Dialect::Postgres => $postgres,
                }
            }

            fn to_sql_output(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                ToSql::to_sql(self)
            }

            fn from_sql_value(value: ValueRef<'_>) -> FromSqlResult<Self> {
                FromSql::column_result(value)
            }
        }
        )+
    };
}

impl_scalar_payload! {
    bool => BOOL, "bool", ["NUMERIC", "BOOLEAN", "BOOLEAN"];
    i64 => INTEGER, "int", ["INTEGER", "BIGINT", "BIGINT"];
    f64 => FLOAT, "float", ["REAL", "DOUBLE", "DOUBLE PRECISION"];
}

impl Payload for String {
    const EXPECTING: BasicTypes = BasicTypes::STRING;
    const ON_MISMATCH: OnMismatch = OnMismatch::Absorb;
    const DATA_TYPE: &'static str = "string";

    fn is_empty_payload(&self) -> bool {
        self.is_empty()
    }

    fn column_type(dialect: Dialect) -> &'static str {
        match dialect {
            Dialect::Sqlite | Dialect::Postgres => "TEXT",
            Dialect::Mysql => "LONGTEXT",
        }
    }

    fn to_sql_output(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        ToSql::to_sql(self)
    }

    fn from_sql_value(value: ValueRef<'_>) -> FromSqlResult<Self> {
        FromSql::column_result(value)
    }
}

/// String arrays are stored as JSON text in SQL; Postgres schemas use a native `text[]` column.
impl Payload for Vec<String> {
    const EXPECTING: BasicTypes = BasicTypes::ARRAY;

    fn is_empty_payload(&self) -> bool {
        self.is_empty()
    }

    fn column_type(dialect: Dialect) -> &'static str {
        match dialect {
            Dialect::Sqlite | Dialect::Mysql => "JSON",
            Dialect::Postgres => "text[]",
        }
    }
}

/// Arbitrary JSON payload.
impl Payload for serde_json::Value {}
