//! Codecs supported by [`Nullable`](crate::Nullable) wrappers.
//!
//! Each codec has its own entry points on `Nullable`:
//!
//! | Codec         | Decoding                                   | Encoding                      |
//! |---------------|--------------------------------------------|-------------------------------|
//! | JSON          | `from_json`, `from_json_field`, serde      | `to_json`, serde              |
//! | BSON          | `from_bson`, `from_bson_field`, `from_bson_bytes` | `to_bson`, `to_bson_bytes` |
//! | MessagePack   | `from_msgpack`, [`from_msgpack_slice`]     | `to_msgpack`                  |
//! | SQL           | [`FromSql`](rusqlite::types::FromSql)      | [`ToSql`](rusqlite::ToSql)    |
//! | text          | [`FromText`](crate::FromText), `FromStr`   | n/a                           |
//!
//! All decoders share the same tri-state contract: a decoder is only invoked for a key that exists,
//! so it always produces a present wrapper; the null marker produces a null wrapper without an error.
//!
//! Wrappers embedded in structs decoded by an arbitrary `serde` format (including `bson::from_document()`
//! and `bson::from_slice()`) follow the JSON error policy. Use [`from_msgpack_slice()`] to decode
//! MessagePack structs with the MessagePack policy.

use std::{cell::Cell, fmt};

pub use self::msgpack::from_msgpack_slice;
pub(crate) use self::sql::{json_from_sql, json_to_sql};

mod bson;
mod json;
mod msgpack;
mod sql;

/// Serialization boundary invoking a wrapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Codec {
    /// Structured text (JSON).
    Json,
    /// Document-database binary format (BSON).
    Bson,
    /// Compact binary map format (MessagePack).
    MessagePack,
    /// Relational driver values.
    Sql,
    /// Flat text such as query string or form values.
    Text,
}

impl fmt::Display for Codec {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(match self {
            Self::Json => "JSON",
            Self::Bson => "BSON",
            Self::MessagePack => "MessagePack",
            Self::Sql => "SQL",
            Self::Text => "text",
        })
    }
}

impl Codec {
    /// Checks whether this codec absorbs conversion errors for payloads that allow it
    /// (see [`OnMismatch`](crate::OnMismatch)).
    ///
    /// MessagePack decodes through an intermediate `Option<T>` and propagates every failure.
    pub const fn absorbs_mismatch(self) -> bool {
        matches!(self, Self::Json | Self::Bson | Self::Text)
    }

    /// Codec assumed for generic `serde` deserialization. This is JSON unless the call is wrapped
    /// in [`Self::scope()`].
    pub(crate) fn for_serde() -> Self {
        SERDE_CODEC.get()
    }

    /// Runs `action` with this codec assumed for generic `serde` deserialization on the current thread.
    pub(crate) fn scope<R>(self, action: impl FnOnce() -> R) -> R {
        let _guard = ScopeGuard(SERDE_CODEC.replace(self));
        action()
    }
}

thread_local! {
    static SERDE_CODEC: Cell<Codec> = const { Cell::new(Codec::Json) };
}

/// Restores the previous codec when dropped, including on panics.
#[derive(Debug)]
struct ScopeGuard(Codec);

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        SERDE_CODEC.set(self.0);
    }
}
