//! Presence-aware wrapper type.

use std::{any::Any, fmt};

/// Observable state of a [`Nullable`] wrapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum State {
    /// The field was not present in the input at all. This is also the state
    /// of a default-initialized wrapper.
    Absent,
    /// The field was present, but null (or could not be converted into the payload type).
    Null,
    /// The field was present and holds a valid payload.
    Valid,
}

/// Value that may be absent, present but null, or present and valid.
///
/// # Invariants
///
/// - A valid wrapper is always present.
/// - If the wrapper is not valid, its data is the payload's [`Default`] value.
///
/// Decoders always produce a present wrapper: they are only invoked for keys that exist in the input.
/// The absent state is produced by [`Default`] (e.g., via `#[serde(default)]` on a struct field)
/// or by explicit construction.
///
/// # Examples
///
/// ```
/// use nullable::{Int, State};
///
/// #[derive(serde::Deserialize)]
/// struct Patch {
///     #[serde(default)]
///     limit: Int,
/// }
///
/// let patch: Patch = serde_json::from_str(r#"{ "limit": null }"#)?;
/// assert_eq!(patch.limit.state(), State::Null);
/// let patch: Patch = serde_json::from_str("{}")?;
/// assert_eq!(patch.limit.state(), State::Absent);
/// let patch: Patch = serde_json::from_str(r#"{ "limit": 10 }"#)?;
/// assert_eq!(patch.limit.as_option(), Some(&10));
/// # anyhow::Ok(())
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Nullable<T> {
    present: bool,
    valid: bool,
    data: T,
}

impl<T> Nullable<T> {
    /// Creates a present and valid wrapper.
    pub const fn new(data: T) -> Self {
        Self {
            present: true,
            valid: true,
            data,
        }
    }

    /// Checks whether the field was present in the input.
    pub const fn is_present(&self) -> bool {
        self.present
    }

    /// Checks whether the field holds a valid payload.
    pub const fn is_valid(&self) -> bool {
        self.valid
    }

    /// Checks whether the field was absent from the input.
    pub const fn is_absent(&self) -> bool {
        !self.present
    }

    /// Checks whether the field was present, but null.
    pub const fn is_null(&self) -> bool {
        self.present && !self.valid
    }

    /// Returns the state of this wrapper.
    pub const fn state(&self) -> State {
        match (self.present, self.valid) {
            (false, _) => State::Absent,
            (true, false) => State::Null,
            (true, true) => State::Valid,
        }
    }

    /// Returns the raw payload. If the wrapper is not valid, this is the payload's default value.
    pub const fn data(&self) -> &T {
        &self.data
    }

    /// Returns a reference to the payload if the wrapper is valid.
    pub const fn as_option(&self) -> Option<&T> {
        if self.valid { Some(&self.data) } else { None }
    }

    /// Converts this wrapper into a two-state optional, erasing the difference between
    /// absent and null fields.
    pub fn into_option(self) -> Option<T> {
        if self.valid { Some(self.data) } else { None }
    }
}

impl<T: Default> Nullable<T> {
    /// Creates a present, but null wrapper.
    pub fn null() -> Self {
        Self {
            present: true,
            valid: false,
            data: T::default(),
        }
    }

    /// Creates a wrapper for a field absent from the input. Equivalent to [`Default`].
    pub fn absent() -> Self {
        Self::default()
    }

    /// Creates a wrapper with explicit flags. `valid` is only honored if `present` is set,
    /// and `data` is discarded for invalid wrappers.
    pub fn with_flags(data: T, present: bool, valid: bool) -> Self {
        let valid = present && valid;
        Self {
            present,
            valid,
            data: if valid { data } else { T::default() },
        }
    }
}

impl<T: Default> From<Option<T>> for Nullable<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or_else(Self::null, Self::new)
    }
}

/// Object-safe view of a [`Nullable`] wrapper allowing to inspect wrappers with different payloads
/// uniformly.
pub trait Presence: fmt::Debug {
    /// Checks whether the field was present in the input.
    fn is_present(&self) -> bool;

    /// Checks whether the field holds a valid payload.
    fn is_valid(&self) -> bool;

    /// Returns the state of the wrapper.
    fn state(&self) -> State {
        match (self.is_present(), self.is_valid()) {
            (false, _) => State::Absent,
            (true, false) => State::Null,
            (true, true) => State::Valid,
        }
    }

    /// Returns the payload if the wrapper is valid.
    fn value_any(&self) -> Option<&dyn Any>;
}

impl<T: fmt::Debug + 'static> Presence for Nullable<T> {
    fn is_present(&self) -> bool {
        self.present
    }

    fn is_valid(&self) -> bool {
        self.valid
    }

    fn value_any(&self) -> Option<&dyn Any> {
        self.as_option().map(|data| data as &dyn Any)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors() {
        let value = Nullable::new(5_i64);
        assert_eq!(value.state(), State::Valid);
        assert_eq!(value.as_option(), Some(&5));

        let value = Nullable::<i64>::null();
        assert_eq!(value.state(), State::Null);
        assert!(value.is_present());
        assert_eq!(value.into_option(), None);

        let value = Nullable::<i64>::absent();
        assert_eq!(value.state(), State::Absent);
        assert_eq!(value, Nullable::default());
    }

    #[test]
    fn explicit_flags_uphold_invariants() {
        let value = Nullable::with_flags(5_i64, false, true);
        assert!(!value.is_valid());
        assert_eq!(value.state(), State::Absent);
        assert_eq!(*value.data(), 0);

        let value = Nullable::with_flags("test".to_owned(), true, false);
        assert_eq!(value.state(), State::Null);
        assert_eq!(value.data(), "");

        let value = Nullable::with_flags(true, true, true);
        assert_eq!(value, Nullable::new(true));
    }

    #[test]
    fn conversion_from_option() {
        assert_eq!(Nullable::from(Some(0.5)), Nullable::new(0.5));
        assert_eq!(Nullable::<f64>::from(None).state(), State::Null);
    }

    #[test]
    fn inspecting_heterogeneous_wrappers() {
        let fields: [&dyn Presence; 3] = [
            &Nullable::new(1_i64),
            &Nullable::<String>::null(),
            &Nullable::<bool>::absent(),
        ];
        let states: Vec<_> = fields.iter().map(|field| field.state()).collect();
        assert_eq!(states, [State::Valid, State::Null, State::Absent]);

        let value = fields[0].value_any().unwrap();
        assert_eq!(value.downcast_ref::<i64>(), Some(&1));
        assert!(fields[1].value_any().is_none());
    }
}
