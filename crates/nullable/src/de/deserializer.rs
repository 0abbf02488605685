//! `serde`-compatible deserializer over a buffered [`Value`].

use serde::de::{
    self, DeserializeSeed, Deserializer, Error as DeError, IntoDeserializer,
    value::{MapDeserializer, SeqDeserializer},
};

use super::DecodeOptions;
use crate::{
    error::DecodeError,
    value::{Map, Value},
};

macro_rules! parse_number_value {
    ($($ty:ident => $method:ident,)*) => {
        $(
        fn $method<V: de::Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
            match self.value {
                Value::Number(number) => number
                    .deserialize_any(visitor)
                    .map_err(DecodeError::json_conversion),
                Value::String(s) if self.options.coerce_strings => match s.trim().parse::<$ty>() {
                    Ok(val) if !CoercedNumber::is_finite_number(&val) => {
                        Err(DecodeError::custom(format_args!(
                            "non-finite {} value '{s}'",
                            stringify!($ty)
                        )))
                    }
                    Ok(val) => <$ty as IntoDeserializer<'de, DecodeError>>::into_deserializer(val)
                        .$method(visitor),
                    Err(err) => Err(DecodeError::custom(format_args!(
                        "{err} while parsing {} value '{s}'",
                        stringify!($ty)
                    ))),
                },
                _ => Err(self.invalid_type(&format!("{} number", stringify!($ty)))),
            }
        }
        )*
    }
}

/// Number parsed from a string. Non-finite floats are rejected since no codec can encode them.
trait CoercedNumber {
    fn is_finite_number(&self) -> bool {
        true
    }
}

impl CoercedNumber for u8 {}
impl CoercedNumber for u16 {}
impl CoercedNumber for u32 {}
impl CoercedNumber for u64 {}
impl CoercedNumber for u128 {}
impl CoercedNumber for i8 {}
impl CoercedNumber for i16 {}
impl CoercedNumber for i32 {}
impl CoercedNumber for i64 {}
impl CoercedNumber for i128 {}

impl CoercedNumber for f32 {
    fn is_finite_number(&self) -> bool {
        self.is_finite()
    }
}

impl CoercedNumber for f64 {
    fn is_finite_number(&self) -> bool {
        self.is_finite()
    }
}

/// Parses a boolean-like string, as found in query strings and form values.
fn parse_bool(raw: &str) -> Option<bool> {
    const TRUTHY: &[&str] = &["true", "1", "yes", "y", "on"];
    const FALSY: &[&str] = &["false", "0", "no", "n", "off"];

    let raw = raw.trim();
    if TRUTHY.iter().any(|s| s.eq_ignore_ascii_case(raw)) {
        Some(true)
    } else if FALSY.iter().any(|s| s.eq_ignore_ascii_case(raw)) {
        Some(false)
    } else {
        None
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct ValueDeserializer<'a> {
    value: &'a Value,
    options: &'a DecodeOptions,
}

impl<'a> ValueDeserializer<'a> {
    pub(crate) fn new(value: &'a Value, options: &'a DecodeOptions) -> Self {
        Self { value, options }
    }

    #[cold]
    pub(crate) fn invalid_type(&self, expected: &str) -> DecodeError {
        DecodeError::invalid_type(self.value.unexpected(), &expected)
    }

    fn parse_array<'de, V: de::Visitor<'de>>(
        &self,
        array: &[Value],
        visitor: V,
    ) -> Result<V::Value, DecodeError> {
        let mut deserializer = SeqDeserializer::new(
            array
                .iter()
                .map(|val| ValueDeserializer::new(val, self.options)),
        );
        let seq = visitor.visit_seq(&mut deserializer)?;
        deserializer.end()?;
        Ok(seq)
    }

    /// Parses a comma-separated list, e.g. `a,b,c` from a query string. Items are coerced further
    /// according to the element type.
    fn parse_delimited<'de, V: de::Visitor<'de>>(
        &self,
        raw: &str,
        visitor: V,
    ) -> Result<V::Value, DecodeError> {
        let items: Vec<_> = raw
            .split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(|item| Value::String(item.to_owned()))
            .collect();
        self.parse_array(&items, visitor)
    }

    fn parse_object<'de, V: de::Visitor<'de>>(
        &self,
        object: &Map,
        visitor: V,
    ) -> Result<V::Value, DecodeError> {
        let mut deserializer = MapDeserializer::new(
            object
                .iter()
                .map(|(key, value)| (key.as_str(), ValueDeserializer::new(value, self.options))),
        );
        let map = visitor.visit_map(&mut deserializer)?;
        deserializer.end()?;
        Ok(map)
    }
}

impl<'de> Deserializer<'de> for ValueDeserializer<'_> {
    type Error = DecodeError;

    fn deserialize_any<V: de::Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        match self.value {
            Value::Null => visitor.visit_none(),
            Value::Bool(value) => visitor.visit_bool(*value),
            Value::Number(value) => value
                .deserialize_any(visitor)
                .map_err(DecodeError::json_conversion),
            Value::String(value) => visitor.visit_str(value),
            Value::Array(array) => self.parse_array(array, visitor),
            Value::Object(object) => self.parse_object(object, visitor),
        }
    }

    fn deserialize_option<V: de::Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        match self.value {
            Value::Null => visitor.visit_none(),
            _ => visitor.visit_some(self),
        }
    }

    fn deserialize_newtype_struct<V: de::Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_seq<V: de::Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        match self.value {
            Value::Array(array) => self.parse_array(array, visitor),
            Value::String(s) if self.options.coerce_strings => self.parse_delimited(s, visitor),
            _ => Err(self.invalid_type("array")),
        }
    }

    fn deserialize_tuple<V: de::Visitor<'de>>(
        self,
        _len: usize,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        self.deserialize_seq(visitor)
    }

    fn deserialize_tuple_struct<V: de::Visitor<'de>>(
        self,
        _name: &'static str,
        _len: usize,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        self.deserialize_seq(visitor)
    }

    fn deserialize_map<V: de::Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        match self.value {
            Value::Object(object) => self.parse_object(object, visitor),
            _ => Err(self.invalid_type("object")),
        }
    }

    fn deserialize_struct<V: de::Visitor<'de>>(
        self,
        _name: &'static str,
        _fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        match self.value {
            Value::Array(array) => self.parse_array(array, visitor),
            Value::Object(object) => self.parse_object(object, visitor),
            _ => Err(self.invalid_type("array or object")),
        }
    }

    fn deserialize_enum<V: de::Visitor<'de>>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        let single_entry = match self.value {
            Value::Object(object) if object.len() == 1 => object.iter().next(),
            _ => None,
        };
        let (variant, value) = match (self.value, single_entry) {
            (Value::String(s), _) => (s.as_str(), None),
            (_, Some((variant, value))) => (variant.as_str(), Some(value)),
            _ => return Err(self.invalid_type("string or object with single key")),
        };

        visitor.visit_enum(EnumDeserializer {
            variant,
            inner: VariantDeserializer {
                value,
                options: self.options,
            },
        })
    }

    // Primitive values

    fn deserialize_bool<V: de::Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        match self.value {
            Value::Bool(value) => visitor.visit_bool(*value),
            Value::String(s) if self.options.coerce_strings => match parse_bool(s) {
                Some(val) => visitor.visit_bool(val),
                None => Err(DecodeError::custom(format_args!(
                    "cannot parse value '{s}' as boolean"
                ))),
            },
            _ => Err(self.invalid_type("boolean")),
        }
    }

    parse_number_value! {
        u8 => deserialize_u8,
        u16 => deserialize_u16,
        u32 => deserialize_u32,
        u64 => deserialize_u64,
        i8 => deserialize_i8,
        i16 => deserialize_i16,
        i32 => deserialize_i32,
        i64 => deserialize_i64,
        u128 => deserialize_u128,
        i128 => deserialize_i128,
        f32 => deserialize_f32,
        f64 => deserialize_f64,
    }

    fn deserialize_string<V: de::Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        match self.value {
            Value::String(s) => visitor.visit_str(s),
            Value::Bool(value) if self.options.coerce_strings => {
                visitor.visit_string(value.to_string())
            }
            Value::Number(value) if self.options.coerce_strings => {
                visitor.visit_string(value.to_string())
            }
            _ => Err(self.invalid_type("string")),
        }
    }

    fn deserialize_char<V: de::Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        self.deserialize_string(visitor)
    }

    fn deserialize_str<V: de::Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        self.deserialize_string(visitor)
    }

    fn deserialize_byte_buf<V: de::Visitor<'de>>(
        self,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        match self.value {
            Value::String(s) => visitor.visit_str(s),
            Value::Array(array) => self.parse_array(array, visitor),
            _ => Err(self.invalid_type("string or array")),
        }
    }

    fn deserialize_bytes<V: de::Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        self.deserialize_byte_buf(visitor)
    }

    fn deserialize_identifier<V: de::Visitor<'de>>(
        self,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        self.deserialize_string(visitor)
    }

    fn deserialize_unit<V: de::Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        match self.value {
            Value::Null => visitor.visit_unit(),
            _ => Err(self.invalid_type("null")),
        }
    }

    fn deserialize_unit_struct<V: de::Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        self.deserialize_unit(visitor)
    }

    fn deserialize_ignored_any<V: de::Visitor<'de>>(
        self,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        visitor.visit_unit()
    }
}

impl IntoDeserializer<'_, DecodeError> for ValueDeserializer<'_> {
    type Deserializer = Self;

    fn into_deserializer(self) -> Self::Deserializer {
        self
    }
}

#[derive(Debug)]
struct EnumDeserializer<'a> {
    variant: &'a str,
    inner: VariantDeserializer<'a>,
}

impl<'a, 'de> de::EnumAccess<'de> for EnumDeserializer<'a> {
    type Error = DecodeError;
    type Variant = VariantDeserializer<'a>;

    fn variant_seed<V: DeserializeSeed<'de>>(
        self,
        seed: V,
    ) -> Result<(V::Value, Self::Variant), Self::Error> {
        let variant = IntoDeserializer::<'de, DecodeError>::into_deserializer(self.variant);
        let value = seed.deserialize(variant)?;
        Ok((value, self.inner))
    }
}

#[derive(Debug)]
struct VariantDeserializer<'a> {
    value: Option<&'a Value>,
    options: &'a DecodeOptions,
}

impl<'de> de::VariantAccess<'de> for VariantDeserializer<'_> {
    type Error = DecodeError;

    fn unit_variant(self) -> Result<(), Self::Error> {
        if let Some(value) = self.value {
            de::Deserialize::deserialize(ValueDeserializer::new(value, self.options))
        } else {
            Ok(())
        }
    }

    fn newtype_variant_seed<T>(self, seed: T) -> Result<T::Value, Self::Error>
    where
        T: DeserializeSeed<'de>,
    {
        if let Some(value) = self.value {
            seed.deserialize(ValueDeserializer::new(value, self.options))
        } else {
            Err(DecodeError::invalid_type(
                de::Unexpected::Unit,
                &"newtype variant",
            ))
        }
    }

    fn tuple_variant<V: de::Visitor<'de>>(
        self,
        _len: usize,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        if let Some(value) = self.value {
            ValueDeserializer::new(value, self.options).deserialize_seq(visitor)
        } else {
            Err(DecodeError::invalid_type(
                de::Unexpected::Unit,
                &"tuple variant",
            ))
        }
    }

    fn struct_variant<V: de::Visitor<'de>>(
        self,
        _fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        if let Some(value) = self.value {
            ValueDeserializer::new(value, self.options).deserialize_map(visitor)
        } else {
            Err(DecodeError::invalid_type(
                de::Unexpected::Unit,
                &"struct variant",
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parsing_bool_like_strings() {
        for raw in ["true", "TRUE", "1", "yes", " on ", "Y"] {
            assert_eq!(parse_bool(raw), Some(true), "{raw}");
        }
        for raw in ["false", "0", "No", "off", "n"] {
            assert_eq!(parse_bool(raw), Some(false), "{raw}");
        }
        for raw in ["", "2", "maybe", "truthy"] {
            assert_eq!(parse_bool(raw), None, "{raw}");
        }
    }
}
