//! JSON codec and generic `serde` integration.

use serde::{Deserialize, Deserializer, Serialize, Serializer, de::Error as _};

use super::Codec;
use crate::{
    de::DecodeOptions,
    error::{DecodeError, EncodeError},
    nullable::Nullable,
    payload::Payload,
    value::Value,
};

/// Serializes the payload if the wrapper is valid, and the null marker otherwise.
impl<T: Serialize> Serialize for Nullable<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.as_option() {
            Some(data) => data.serialize(serializer),
            None => serializer.serialize_none(),
        }
    }
}

/// Buffers the input and decodes it according to the tri-state contract. Conversion errors follow
/// the JSON policy, unless decoding is wrapped in [`from_msgpack_slice()`](crate::codec::from_msgpack_slice).
///
/// A key missing from the input never reaches this implementation; mark the field with `#[serde(default)]`
/// to get an absent wrapper in this case.
impl<'de, T: Payload> Deserialize<'de> for Nullable<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let codec = Codec::for_serde();
        let value = Value::deserialize(deserializer)?;
        Self::decode(&value, codec, &DecodeOptions::default()).map_err(D::Error::custom)
    }
}

impl<T: Payload> Nullable<T> {
    /// Decodes a wrapper from JSON bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes are not valid JSON, or if the JSON cannot be converted into the payload
    /// and the payload doesn't absorb conversion errors.
    pub fn from_json(bytes: &[u8]) -> Result<Self, DecodeError> {
        Self::from_json_with(bytes, &DecodeOptions::default())
    }

    /// Decodes a wrapper from JSON bytes using the specified options.
    ///
    /// # Errors
    ///
    /// See [`Self::from_json()`].
    pub fn from_json_with(bytes: &[u8], options: &DecodeOptions) -> Result<Self, DecodeError> {
        let value: Value = serde_json::from_slice(bytes).map_err(|err| {
            DecodeError::json_syntax(err)
                .for_codec(Codec::Json)
                .for_payload::<T>()
        })?;
        Self::decode(&value, Codec::Json, options)
    }

    /// Decodes a field of a JSON object. A missing key produces an absent wrapper.
    ///
    /// # Errors
    ///
    /// See [`Self::from_json()`].
    pub fn from_json_field(
        object: &serde_json::Map<String, serde_json::Value>,
        key: &str,
    ) -> Result<Self, DecodeError> {
        let value = object.get(key).cloned().map(Value::from);
        Self::decode_field(value.as_ref(), Codec::Json, &DecodeOptions::default())
    }

    /// Encodes this wrapper as JSON bytes.
    ///
    /// # Errors
    ///
    /// Propagates payload serialization errors.
    pub fn to_json(&self) -> Result<Vec<u8>, EncodeError> {
        serde_json::to_vec(self).map_err(EncodeError::json)
    }
}
