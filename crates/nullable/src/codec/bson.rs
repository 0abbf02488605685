//! BSON codec.

use bson::{Bson, Document};

use super::Codec;
use crate::{
    de::DecodeOptions,
    error::{DecodeError, EncodeError},
    nullable::Nullable,
    payload::Payload,
    value::{Map, Value},
};

/// Converts a BSON value into the codec-neutral model. Date-times are converted into RFC 3339 strings,
/// and object IDs into hex strings.
pub(crate) fn bson_to_value(bson: &Bson) -> Result<Value, DecodeError> {
    Ok(match bson {
        Bson::Null | Bson::Undefined => Value::Null,
        Bson::Boolean(value) => Value::Bool(*value),
        Bson::Int32(value) => Value::Number((*value).into()),
        Bson::Int64(value) => Value::Number((*value).into()),
        Bson::Double(value) => serde_json::Number::from_f64(*value)
            .map(Value::Number)
            .ok_or_else(|| DecodeError::unsupported(format_args!("non-finite BSON double {value}")))?,
        Bson::String(value) | Bson::Symbol(value) => Value::String(value.clone()),
        Bson::Array(array) => Value::Array(array.iter().map(bson_to_value).collect::<Result<_, _>>()?),
        Bson::Document(document) => Value::Object(document_to_map(document)?),
        Bson::DateTime(timestamp) => {
            let millis = timestamp.timestamp_millis();
            Value::from_timestamp_millis(millis).ok_or_else(|| {
                DecodeError::unsupported(format_args!("BSON date-time {millis}ms is out of range"))
            })?
        }
        Bson::ObjectId(id) => Value::String(id.to_hex()),
        other => {
            return Err(DecodeError::unsupported(format_args!(
                "unsupported BSON element type: {:?}",
                other.element_type()
            )));
        }
    })
}

fn document_to_map(document: &Document) -> Result<Map, DecodeError> {
    document
        .iter()
        .map(|(key, value)| Ok::<_, DecodeError>((key.clone(), bson_to_value(value)?)))
        .collect()
}

impl<T: Payload> Nullable<T> {
    /// Encodes this wrapper as a BSON value. Invalid wrappers are encoded as [`Bson::Null`].
    ///
    /// # Errors
    ///
    /// Propagates payload serialization errors.
    pub fn to_bson(&self) -> Result<Bson, EncodeError> {
        match self.as_option() {
            Some(data) => data.to_bson().map_err(EncodeError::bson),
            None => Ok(Bson::Null),
        }
    }

    /// Decodes a wrapper from a BSON value.
    ///
    /// # Errors
    ///
    /// Returns an error if the value has an unsupported element type (e.g., binary or regex), or if it cannot be
    /// converted into the payload and the payload doesn't absorb conversion errors.
    pub fn from_bson(value: &Bson) -> Result<Self, DecodeError> {
        Self::from_bson_with(value, &DecodeOptions::default())
    }

    /// Decodes a wrapper from a BSON value using the specified options.
    ///
    /// # Errors
    ///
    /// See [`Self::from_bson()`].
    pub fn from_bson_with(value: &Bson, options: &DecodeOptions) -> Result<Self, DecodeError> {
        let value = bson_to_value(value).map_err(|err| err.for_codec(Codec::Bson).for_payload::<T>())?;
        Self::decode(&value, Codec::Bson, options)
    }

    /// Decodes a document field. A missing key produces an absent wrapper.
    ///
    /// # Errors
    ///
    /// See [`Self::from_bson()`].
    pub fn from_bson_field(document: &Document, key: &str) -> Result<Self, DecodeError> {
        match document.get(key) {
            Some(value) => Self::from_bson(value),
            None => Ok(Self::absent()),
        }
    }

    /// Decodes a field from a serialized BSON document.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes are not a valid BSON document, or under the same conditions
    /// as [`Self::from_bson()`].
    pub fn from_bson_bytes(bytes: &[u8], key: &str) -> Result<Self, DecodeError> {
        let document = Document::from_reader(bytes)
            .map_err(|err| DecodeError::bson(err).for_codec(Codec::Bson).for_payload::<T>())?;
        Self::from_bson_field(&document, key)
    }

    /// Serializes this wrapper as a single-field BSON document.
    ///
    /// # Errors
    ///
    /// Propagates payload serialization errors.
    pub fn to_bson_bytes(&self, key: &str) -> Result<Vec<u8>, EncodeError> {
        let mut document = Document::new();
        document.insert(key, self.to_bson()?);
        let mut bytes = vec![];
        document.to_writer(&mut bytes).map_err(EncodeError::bson)?;
        Ok(bytes)
    }
}
