//! MessagePack codec.

use serde::de::DeserializeOwned;

use super::Codec;
use crate::{
    de::DecodeOptions,
    error::{DecodeError, EncodeError},
    nullable::Nullable,
    payload::Payload,
    value::Value,
};

/// Decodes a value (usually a struct with wrapper fields) from MessagePack bytes. Wrappers inside
/// the value propagate every conversion error, like [`Nullable::from_msgpack()`].
///
/// # Errors
///
/// Returns an error if the bytes are not valid MessagePack, or if any part of the value cannot be decoded.
pub fn from_msgpack_slice<S: DeserializeOwned>(
    bytes: &[u8],
) -> Result<S, rmp_serde::decode::Error> {
    Codec::MessagePack.scope(|| rmp_serde::from_slice(bytes))
}

impl<T: Payload> Nullable<T> {
    /// Encodes this wrapper as MessagePack. Structs in the payload are encoded as maps with named fields.
    ///
    /// # Errors
    ///
    /// Propagates payload serialization errors.
    pub fn to_msgpack(&self) -> Result<Vec<u8>, EncodeError> {
        rmp_serde::to_vec_named(self).map_err(EncodeError::msgpack)
    }

    /// Decodes a wrapper from MessagePack bytes. Unlike JSON and BSON, conversion errors are never absorbed.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes are not valid MessagePack, or if the value cannot be converted
    /// into the payload.
    pub fn from_msgpack(bytes: &[u8]) -> Result<Self, DecodeError> {
        let value: Value = rmp_serde::from_slice(bytes).map_err(|err| {
            DecodeError::msgpack(err)
                .for_codec(Codec::MessagePack)
                .for_payload::<T>()
        })?;
        Self::decode(&value, Codec::MessagePack, &DecodeOptions::default())
    }
}
