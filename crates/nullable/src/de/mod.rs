//! Decoding logic shared by all codecs.
//!
//! Every codec converts its input into a [`Value`] and then calls [`Nullable::decode()`], which implements
//! the tri-state contract:
//!
//! 1. The decoder is only invoked for a key that exists, so the output is always present.
//! 2. The codec's null marker produces a null wrapper without an error.
//! 3. Otherwise, the value is converted via [`Payload::decode()`]. On success, the wrapper is valid
//!    unless the payload is [empty](Payload::is_empty_payload()).
//! 4. Conversion errors are either absorbed into a null wrapper or propagated, depending on the payload's
//!    [`OnMismatch`] policy, the codec and [`DecodeOptions::strict`].

use std::any;

pub use self::text::FromText;
pub(crate) use self::deserializer::ValueDeserializer;
use crate::{
    codec::Codec,
    error::DecodeError,
    nullable::Nullable,
    payload::{OnMismatch, Payload},
    value::Value,
};

mod deserializer;
#[cfg(test)]
mod tests;
mod text;

/// Available decoding options.
#[derive(Debug, Clone, Default)]
pub struct DecodeOptions {
    /// Enables coercion of strings to other primitive types (e.g., `"42"` to an integer,
    /// `"yes"` to a boolean, or `"a,b"` to an array), and of numbers and booleans to strings.
    /// This is enabled for text inputs such as query strings.
    pub coerce_strings: bool,
    /// Propagates conversion errors for all payloads, instead of absorbing them for payloads
    /// with the [`OnMismatch::Absorb`] policy.
    pub strict: bool,
}

impl DecodeOptions {
    /// Options used for flat text inputs.
    pub(crate) fn text() -> Self {
        Self {
            coerce_strings: true,
            strict: false,
        }
    }
}

impl<T: Payload> Nullable<T> {
    /// Decodes a wrapper from a buffered value for a key that is present in the input.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be converted into the payload, and the error is not absorbed
    /// (see the [module docs](crate::de) for details).
    pub fn decode(value: &Value, codec: Codec, options: &DecodeOptions) -> Result<Self, DecodeError> {
        if value.is_null() {
            tracing::trace!(%codec, payload = any::type_name::<T>(), "decoded null marker");
            return Ok(Self::null());
        }

        match T::decode(value, options) {
            Ok(data) if data.is_empty_payload() => {
                tracing::trace!(%codec, payload = any::type_name::<T>(), "decoded empty payload");
                Ok(Self::null())
            }
            Ok(data) => Ok(Self::new(data)),
            Err(err) if Self::absorbs_mismatch(codec, options) => {
                tracing::warn!(
                    %codec,
                    payload = any::type_name::<T>(),
                    %err,
                    "value cannot be converted to payload; marking it as null"
                );
                Ok(Self::null())
            }
            Err(err) => Err(err.for_codec(codec).for_payload::<T>()),
        }
    }

    /// Decodes a wrapper from an optional value, e.g. a lookup result in an object.
    /// A missing value produces an absent wrapper.
    ///
    /// # Errors
    ///
    /// Propagates errors from [`Self::decode()`].
    pub fn decode_field(
        value: Option<&Value>,
        codec: Codec,
        options: &DecodeOptions,
    ) -> Result<Self, DecodeError> {
        match value {
            Some(value) => Self::decode(value, codec, options),
            None => Ok(Self::absent()),
        }
    }

    fn absorbs_mismatch(codec: Codec, options: &DecodeOptions) -> bool {
        T::ON_MISMATCH == OnMismatch::Absorb && codec.absorbs_mismatch() && !options.strict
    }
}
