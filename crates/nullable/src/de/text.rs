//! Decoding from flat text, such as query string or form values.

use std::{convert::Infallible, str::FromStr};

use super::DecodeOptions;
use crate::{codec::Codec, nullable::Nullable, payload::Payload, value::{BasicTypes, Value}};

/// Infallible conversion from a flat text value.
///
/// Text decoding never fails: text that cannot be converted into the payload produces
/// a present, but null wrapper. Strings are coerced to the payload type where possible:
///
/// ```
/// use nullable::{Bool, FromText, Int, State, Str, StringArray};
///
/// assert_eq!(Int::from_text("42").as_option(), Some(&42));
/// assert_eq!(Int::from_text("forty-two").state(), State::Null);
/// assert_eq!(Bool::from_text("yes").as_option(), Some(&true));
/// let tags = StringArray::from_text("a, b");
/// assert_eq!(tags.as_option().unwrap(), &["a", "b"]);
/// // Text that is a JSON array is parsed as such
/// let tags = StringArray::from_text(r#"["a, b"]"#);
/// assert_eq!(tags.as_option().unwrap(), &["a, b"]);
/// ```
pub trait FromText: Sized {
    /// Converts the text into a value.
    fn from_text(raw: &str) -> Self;
}

impl<T: Payload> FromText for Nullable<T> {
    fn from_text(raw: &str) -> Self {
        if raw.is_empty() {
            return Self::null();
        }

        let accepts_structures = T::EXPECTING.contains(BasicTypes::ARRAY)
            || T::EXPECTING.contains(BasicTypes::OBJECT);
        let value = if accepts_structures {
            Value::from_text(raw)
        } else {
            Value::String(raw.to_owned())
        };
        match Self::decode(&value, Codec::Text, &DecodeOptions::text()) {
            Ok(decoded) => decoded,
            Err(err) => {
                tracing::debug!(%err, "cannot decode text value; marking it as null");
                Self::null()
            }
        }
    }
}

impl<T: Payload> FromStr for Nullable<T> {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_text(s))
    }
}
