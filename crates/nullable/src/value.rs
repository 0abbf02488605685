//! Codec-neutral value model.
//!
//! Every codec first converts its input into a [`Value`]; payloads are then decoded from this value
//! by the same set of rules regardless of where the input came from. This is what allows a single
//! [`Payload`](crate::Payload) implementation to serve JSON, BSON, MessagePack and text inputs.

use std::{collections::BTreeMap, fmt};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::de::{self, Deserialize, Deserializer, MapAccess, SeqAccess, Visitor};

/// Set of basic value types, used to describe which inputs a [`Payload`](crate::Payload) accepts.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct BasicTypes(u8);

impl BasicTypes {
    /// Boolean value.
    pub const BOOL: Self = Self(1);
    /// Integer value.
    pub const INTEGER: Self = Self(2);
    /// Floating-point value. Integers are accepted as floats.
    pub const FLOAT: Self = Self(4 | 2);
    /// String.
    pub const STRING: Self = Self(8);
    /// Array of values.
    pub const ARRAY: Self = Self(16);
    /// Object / map of values.
    pub const OBJECT: Self = Self(32);
    /// Any value.
    pub const ANY: Self = Self(63);

    const COMPONENTS: &'static [(Self, &'static str)] = &[
        (Self::BOOL, "Boolean"),
        (Self::INTEGER, "integer"),
        (Self::FLOAT, "float"),
        (Self::STRING, "string"),
        (Self::ARRAY, "array"),
        (Self::OBJECT, "object"),
    ];

    /// Returns a union of two sets of basic types.
    #[must_use]
    pub const fn or(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }

    /// Checks whether the `needle` is fully contained in this set.
    pub const fn contains(self, needle: Self) -> bool {
        self.0 & needle.0 == needle.0
    }
}

impl fmt::Display for BasicTypes {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::ANY {
            formatter.write_str("any")
        } else {
            let mut is_empty = true;
            for &(component, name) in Self::COMPONENTS {
                // `FLOAT` includes `INTEGER`; don't list the integer separately in this case
                if component == Self::INTEGER && self.contains(Self::FLOAT) {
                    continue;
                }
                if self.contains(component) {
                    if !is_empty {
                        formatter.write_str(" | ")?;
                    }
                    formatter.write_str(name)?;
                    is_empty = false;
                }
            }
            Ok(())
        }
    }
}

impl fmt::Debug for BasicTypes {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, formatter)
    }
}

/// Object / map of values.
pub type Map = BTreeMap<String, Value>;

/// JSON-like value buffered from a codec.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// Null marker (JSON `null`, BSON null / undefined, MessagePack `nil`).
    #[default]
    Null,
    /// Boolean value.
    Bool(bool),
    /// Numeric value.
    Number(serde_json::Number),
    /// String value.
    String(String),
    /// Array of values.
    Array(Vec<Value>),
    /// Object / map of values.
    Object(Map),
}

impl Value {
    /// Checks whether this value is the null marker.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the basic type of this value, or `None` for [`Self::Null`].
    pub fn basic_type(&self) -> Option<BasicTypes> {
        Some(match self {
            Self::Null => return None,
            Self::Bool(_) => BasicTypes::BOOL,
            Self::Number(number) if number.is_u64() || number.is_i64() => BasicTypes::INTEGER,
            Self::Number(_) => BasicTypes::FLOAT,
            Self::String(_) => BasicTypes::STRING,
            Self::Array(_) => BasicTypes::ARRAY,
            Self::Object(_) => BasicTypes::OBJECT,
        })
    }

    pub(crate) fn is_supported_by(&self, expecting: BasicTypes) -> bool {
        self.basic_type().is_none_or(|ty| expecting.contains(ty))
    }

    /// Attempts to convert this value to a string slice.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Attempts to convert this value to an object.
    pub fn as_object(&self) -> Option<&Map> {
        match self {
            Self::Object(map) => Some(map),
            _ => None,
        }
    }

    /// Interprets a flat text input, such as a query string value.
    ///
    /// Text that is a JSON array or object is parsed as such; everything else is kept as a string
    /// so that payloads can coerce it.
    pub fn from_text(raw: &str) -> Self {
        let trimmed = raw.trim_start();
        if trimmed.starts_with('[') || trimmed.starts_with('{') {
            if let Ok(value @ (Self::Array(_) | Self::Object(_))) = serde_json::from_str(raw) {
                return value;
            }
        }
        Self::String(raw.to_owned())
    }

    /// Creates an RFC 3339 string for a Unix timestamp in milliseconds.
    pub(crate) fn from_timestamp_millis(millis: i64) -> Option<Self> {
        let timestamp = DateTime::<Utc>::from_timestamp_millis(millis)?;
        Some(Self::String(
            timestamp.to_rfc3339_opts(SecondsFormat::AutoSi, true),
        ))
    }

    /// Collapses extended JSON wrappers (`{ "$date": .. }`, `{ "$oid": .. }`) that BSON deserializers
    /// produce for date-times and object IDs.
    fn from_extended_json(object: &Map) -> Option<Self> {
        if object.len() != 1 {
            return None;
        }
        let (key, value) = object.iter().next()?;
        match (key.as_str(), value) {
            ("$date", Self::Number(millis)) => Self::from_timestamp_millis(millis.as_i64()?),
            ("$date", Self::String(raw)) => match raw.parse::<i64>() {
                Ok(millis) => Self::from_timestamp_millis(millis),
                Err(_) => Some(Self::String(raw.clone())),
            },
            ("$date", Self::Object(inner)) => {
                let millis = inner.get("$numberLong")?.as_str()?.parse().ok()?;
                Self::from_timestamp_millis(millis)
            }
            ("$oid", Self::String(hex)) => Some(Self::String(hex.clone())),
            ("$oid", Self::Array(bytes)) => {
                let bytes = bytes
                    .iter()
                    .map(|byte| match byte {
                        Self::Number(byte) => u8::try_from(byte.as_u64()?).ok(),
                        _ => None,
                    })
                    .collect::<Option<Vec<_>>>()?;
                Some(Self::String(hex::encode(bytes)))
            }
            _ => None,
        }
    }

    pub(crate) fn unexpected(&self) -> de::Unexpected<'_> {
        match self {
            Self::Null => de::Unexpected::Unit,
            Self::Bool(value) => de::Unexpected::Bool(*value),
            Self::Number(value) => {
                if let Some(value) = value.as_u64() {
                    de::Unexpected::Unsigned(value)
                } else if let Some(value) = value.as_i64() {
                    de::Unexpected::Signed(value)
                } else if let Some(value) = value.as_f64() {
                    de::Unexpected::Float(value)
                } else {
                    de::Unexpected::Other("number")
                }
            }
            Self::String(s) => de::Unexpected::Str(s),
            Self::Array(_) => de::Unexpected::Seq,
            Self::Object(_) => de::Unexpected::Map,
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(value) => Self::Bool(value),
            serde_json::Value::Number(value) => Self::Number(value),
            serde_json::Value::String(value) => Self::String(value),
            serde_json::Value::Array(array) => {
                Self::Array(array.into_iter().map(Self::from).collect())
            }
            serde_json::Value::Object(object) => Self::Object(
                object
                    .into_iter()
                    .map(|(key, value)| (key, Self::from(value)))
                    .collect(),
            ),
        }
    }
}

impl From<Value> for serde_json::Value {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(value) => Self::Bool(value),
            Value::Number(value) => Self::Number(value),
            Value::String(value) => Self::String(value),
            Value::Array(array) => Self::Array(array.into_iter().map(Self::from).collect()),
            Value::Object(object) => Self::Object(
                object
                    .into_iter()
                    .map(|(key, value)| (key, Self::from(value)))
                    .collect(),
            ),
        }
    }
}

/// Buffers a value from any self-describing format.
impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(ValueVisitor)
    }
}

#[derive(Debug)]
struct ValueVisitor;

impl<'de> Visitor<'de> for ValueVisitor {
    type Value = Value;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("any value")
    }

    fn visit_bool<E: de::Error>(self, value: bool) -> Result<Self::Value, E> {
        Ok(Value::Bool(value))
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> Result<Self::Value, E> {
        Ok(Value::Number(value.into()))
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> Result<Self::Value, E> {
        Ok(Value::Number(value.into()))
    }

    fn visit_f64<E: de::Error>(self, value: f64) -> Result<Self::Value, E> {
        serde_json::Number::from_f64(value)
            .map(Value::Number)
            .ok_or_else(|| E::invalid_value(de::Unexpected::Float(value), &"finite number"))
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
        Ok(Value::String(value.to_owned()))
    }

    fn visit_string<E: de::Error>(self, value: String) -> Result<Self::Value, E> {
        Ok(Value::String(value))
    }

    fn visit_bytes<E: de::Error>(self, value: &[u8]) -> Result<Self::Value, E> {
        let bytes = value.iter().map(|&byte| Value::Number(byte.into()));
        Ok(Value::Array(bytes.collect()))
    }

    fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(Value::Null)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
        Value::deserialize(deserializer)
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(Value::Null)
    }

    fn visit_newtype_struct<D: Deserializer<'de>>(
        self,
        deserializer: D,
    ) -> Result<Self::Value, D::Error> {
        Value::deserialize(deserializer)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0).min(1_024));
        while let Some(item) = seq.next_element()? {
            items.push(item);
        }
        Ok(Value::Array(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
        let mut object = Map::new();
        while let Some((key, value)) = map.next_entry::<String, Value>()? {
            object.insert(key, value);
        }
        Ok(Value::from_extended_json(&object).unwrap_or(Value::Object(object)))
    }
}
