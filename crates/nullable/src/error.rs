//! Decoding and encoding errors.

use std::{any, fmt};

use serde::de;

use crate::codec::Codec;

/// Coarse category of a [`DecodeError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum DecodeErrorCategory {
    /// Input is not well-formed for the codec, e.g. invalid JSON or a truncated MessagePack buffer.
    Syntax,
    /// Input is well-formed, but cannot be converted into the payload type.
    Conversion,
    /// Timestamp string could not be parsed.
    InvalidDate,
    /// Geometry input is malformed.
    Geometry,
}

#[derive(Debug)]
enum DecodeSource {
    Message(String),
    Json(serde_json::Error),
    Bson(bson::de::Error),
    MessagePack(rmp_serde::decode::Error),
    Hex(hex::FromHexError),
}

impl fmt::Display for DecodeSource {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Message(message) => formatter.write_str(message),
            Self::Json(err) => fmt::Display::fmt(err, formatter),
            Self::Bson(err) => fmt::Display::fmt(err, formatter),
            Self::MessagePack(err) => fmt::Display::fmt(err, formatter),
            Self::Hex(err) => fmt::Display::fmt(err, formatter),
        }
    }
}

/// Error decoding a [`Nullable`](crate::Nullable) wrapper or a payload.
///
/// Only structural failures and failures of payloads that never absorb errors (timestamps, geometry,
/// string arrays, user-defined types) surface as this error; see [`OnMismatch`](crate::OnMismatch).
pub struct DecodeError {
    category: DecodeErrorCategory,
    source: DecodeSource,
    codec: Option<Codec>,
    payload: Option<&'static str>,
}

impl fmt::Debug for DecodeError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("DecodeError")
            .field("category", &self.category)
            .field("source", &self.source)
            .field("codec", &self.codec)
            .field("payload", &self.payload)
            .finish()
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let payload = self
            .payload
            .map_or_else(String::new, |ty| format!(" `{ty}`"));
        let codec = self
            .codec
            .map_or_else(String::new, |codec| format!(" from {codec}"));
        write!(
            formatter,
            "error decoding{payload}{codec}: {err}",
            err = self.source
        )
    }
}

impl std::error::Error for DecodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.source {
            DecodeSource::Message(_) => None,
            DecodeSource::Json(err) => Some(err),
            DecodeSource::Bson(err) => Some(err),
            DecodeSource::MessagePack(err) => Some(err),
            DecodeSource::Hex(err) => Some(err),
        }
    }
}

impl de::Error for DecodeError {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Self::new(
            DecodeErrorCategory::Conversion,
            DecodeSource::Message(msg.to_string()),
        )
    }
}

impl DecodeError {
    fn new(category: DecodeErrorCategory, source: DecodeSource) -> Self {
        Self {
            category,
            source,
            codec: None,
            payload: None,
        }
    }

    pub(crate) fn json_syntax(err: serde_json::Error) -> Self {
        Self::new(DecodeErrorCategory::Syntax, DecodeSource::Json(err))
    }

    pub(crate) fn json_conversion(err: serde_json::Error) -> Self {
        Self::new(DecodeErrorCategory::Conversion, DecodeSource::Json(err))
    }

    pub(crate) fn bson(err: bson::de::Error) -> Self {
        Self::new(DecodeErrorCategory::Syntax, DecodeSource::Bson(err))
    }

    pub(crate) fn msgpack(err: rmp_serde::decode::Error) -> Self {
        Self::new(DecodeErrorCategory::Syntax, DecodeSource::MessagePack(err))
    }

    pub(crate) fn unsupported(message: impl fmt::Display) -> Self {
        Self::new(
            DecodeErrorCategory::Syntax,
            DecodeSource::Message(message.to_string()),
        )
    }

    pub(crate) fn invalid_date(raw: &str) -> Self {
        Self::new(
            DecodeErrorCategory::InvalidDate,
            DecodeSource::Message(format!("invalid date string '{raw}'")),
        )
    }

    pub(crate) fn geometry(message: impl fmt::Display) -> Self {
        Self::new(
            DecodeErrorCategory::Geometry,
            DecodeSource::Message(format!("invalid geometry: {message}")),
        )
    }

    pub(crate) fn geometry_hex(err: hex::FromHexError) -> Self {
        Self::new(DecodeErrorCategory::Geometry, DecodeSource::Hex(err))
    }

    /// Returns the category of this error.
    pub fn category(&self) -> DecodeErrorCategory {
        self.category
    }

    /// Returns the codec that was decoding the input, if known.
    pub fn codec(&self) -> Option<Codec> {
        self.codec
    }

    /// Returns the Rust name of the payload type that failed to decode, if known.
    pub fn payload_type(&self) -> Option<&'static str> {
        self.payload
    }

    pub(crate) fn for_codec(mut self, codec: Codec) -> Self {
        self.codec = self.codec.or(Some(codec));
        self
    }

    pub(crate) fn for_payload<T>(mut self) -> Self {
        self.payload = self.payload.or(Some(any::type_name::<T>()));
        self
    }
}

#[derive(Debug)]
enum EncodeSource {
    Json(serde_json::Error),
    Bson(bson::ser::Error),
    MessagePack(rmp_serde::encode::Error),
    Geometry(String),
}

/// Error encoding a [`Nullable`](crate::Nullable) wrapper or a payload.
#[derive(Debug)]
pub struct EncodeError {
    codec: Codec,
    source: EncodeSource,
}

impl fmt::Display for EncodeError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "error encoding to {}: ", self.codec)?;
        match &self.source {
            EncodeSource::Json(err) => fmt::Display::fmt(err, formatter),
            EncodeSource::Bson(err) => fmt::Display::fmt(err, formatter),
            EncodeSource::MessagePack(err) => fmt::Display::fmt(err, formatter),
            EncodeSource::Geometry(message) => write!(formatter, "invalid geometry: {message}"),
        }
    }
}

impl std::error::Error for EncodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.source {
            EncodeSource::Json(err) => Some(err),
            EncodeSource::Bson(err) => Some(err),
            EncodeSource::MessagePack(err) => Some(err),
            EncodeSource::Geometry(_) => None,
        }
    }
}

impl EncodeError {
    pub(crate) fn json(err: serde_json::Error) -> Self {
        Self {
            codec: Codec::Json,
            source: EncodeSource::Json(err),
        }
    }

    pub(crate) fn bson(err: bson::ser::Error) -> Self {
        Self {
            codec: Codec::Bson,
            source: EncodeSource::Bson(err),
        }
    }

    pub(crate) fn msgpack(err: rmp_serde::encode::Error) -> Self {
        Self {
            codec: Codec::MessagePack,
            source: EncodeSource::MessagePack(err),
        }
    }

    pub(crate) fn geometry(codec: Codec, message: impl fmt::Display) -> Self {
        Self {
            codec,
            source: EncodeSource::Geometry(message.to_string()),
        }
    }

    /// Returns the codec that failed to encode the value.
    pub fn codec(&self) -> Codec {
        self.codec
    }
}
