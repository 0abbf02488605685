//! Presence-aware nullable field wrappers.
//!
//! # Overview
//!
//! Partial updates (e.g., `PATCH` requests) need to distinguish three states for each field: the field
//! is absent from the input entirely, it is present but explicitly null, or it is present with a value.
//! `Option<T>` can only express two of these states. [`Nullable`] carries the missing bit: it records
//! whether a field was [present](Nullable::is_present()), whether it holds a [valid](Nullable::is_valid()) payload,
//! and the payload itself.
//!
//! Wrappers implement the same tri-state contract across several serialization boundaries:
//!
//! - JSON and any other self-describing `serde` format
//! - BSON (document databases)
//! - MessagePack
//! - SQL driver values via [`rusqlite`]
//! - flat text (query string / form values) via [`FromText`]
//!
//! Each codec follows the same rules; see the [`de`] module for details.
//!
//! # Payloads
//!
//! Aliases are provided for the common payloads: [`Bool`], [`Int`], [`Float`], [`Str`], [`StringArray`],
//! [`Time`], and geometries ([`GeomPoint`], [`GeomPolygon`], [`GeomMultiPolygon`]). User-defined types
//! can be wrapped as [`Type`] after implementing the [`Payload`] trait, which usually requires
//! a one-line `impl`.
//!
//! Scalar payloads (booleans, numbers and strings) are lenient: if a JSON or BSON value cannot be converted
//! into the payload type, the wrapper is marked as null instead of failing the whole document. Such conversions
//! are logged on the `WARN` level and can be turned into errors with [`DecodeOptions::strict`].
//!
//! # Examples
//!
//! ```
//! use nullable::{Int, State, Str};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Serialize, Deserialize)]
//! struct UserPatch {
//!     #[serde(default, skip_serializing_if = "Str::is_absent")]
//!     name: Str,
//!     #[serde(default, skip_serializing_if = "Int::is_absent")]
//!     age: Int,
//! }
//!
//! let patch: UserPatch = serde_json::from_str(r#"{ "age": null }"#)?;
//! assert_eq!(patch.name.state(), State::Absent);
//! assert_eq!(patch.age.state(), State::Null);
//! // Absent fields are skipped, and null fields are preserved when serializing.
//! assert_eq!(serde_json::to_string(&patch)?, r#"{"age":null}"#);
//!
//! // Strings in place of numbers are absorbed into a null value for scalar payloads.
//! let patch: UserPatch = serde_json::from_str(r#"{ "age": "old", "name": "Alice" }"#)?;
//! assert_eq!(patch.age.state(), State::Null);
//! assert_eq!(patch.name.as_option().map(String::as_str), Some("Alice"));
//! # anyhow::Ok(())
//! ```

// Documentation settings
#![doc(html_root_url = "https://docs.rs/nullable/0.3.0")] // x-release-please-version
#![cfg_attr(docsrs, feature(doc_cfg))]
// Linter settings
#![warn(missing_docs)]

use chrono::{DateTime, Utc};

pub use self::{
    codec::Codec,
    de::{DecodeOptions, FromText},
    error::{DecodeError, DecodeErrorCategory, EncodeError},
    geom::{GeomMultiPolygon, GeomPoint, GeomPolygon},
    nullable::{Nullable, Presence, State},
    payload::{OnMismatch, Payload},
    schema::{Dialect, UnknownDialect},
    time::{Calendar, parse_timestamp},
};

pub mod codec;
pub mod de;
mod error;
mod geom;
mod nullable;
mod payload;
mod schema;
#[cfg(test)]
mod testonly;
mod time;
pub mod value;

/// Nullable boolean.
pub type Bool = Nullable<bool>;
/// Nullable 64-bit signed integer.
pub type Int = Nullable<i64>;
/// Nullable 64-bit floating-point number.
pub type Float = Nullable<f64>;
/// Nullable string. Empty strings are decoded as null.
pub type Str = Nullable<String>;
/// Nullable array of strings. Empty arrays are decoded as null.
pub type StringArray = Nullable<Vec<String>>;
/// Nullable UTC timestamp.
pub type Time = Nullable<DateTime<Utc>>;
/// Nullable user-defined payload.
pub type Type<D> = Nullable<D>;

#[cfg(doctest)]
doc_comment::doctest!("../README.md");
