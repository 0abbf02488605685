use assert_matches::assert_matches;
use proptest::prelude::*;
use serde::Deserialize;
use serde_json::json;

use super::{DecodeOptions, FromText, ValueDeserializer};
use crate::{
    Bool, Codec, DecodeErrorCategory, Float, GeomPoint, Int, Nullable, State, Str, StringArray,
    Time, Type,
    testonly::{TestValue, json_value, sample_value},
    value::Value,
};

fn decode<T: crate::Payload>(json: serde_json::Value, codec: Codec) -> Nullable<T> {
    Nullable::decode(&json_value(json), codec, &DecodeOptions::default()).unwrap()
}

#[test]
fn null_marker_is_never_an_error() {
    for codec in [Codec::Json, Codec::Bson, Codec::MessagePack, Codec::Text] {
        assert_eq!(decode::<bool>(json!(null), codec).state(), State::Null);
        assert_eq!(decode::<String>(json!(null), codec).state(), State::Null);
        assert_eq!(decode::<Vec<String>>(json!(null), codec).state(), State::Null);
        assert_eq!(decode::<TestValue>(json!(null), codec).state(), State::Null);
        let time: Time = decode(json!(null), codec);
        assert!(time.is_present());
        assert!(!time.is_valid());
    }
}

#[test]
fn decoding_valid_scalars() {
    let value: Bool = decode(json!(true), Codec::Json);
    assert_eq!(value, Bool::new(true));
    let value: Int = decode(json!(-5), Codec::Json);
    assert_eq!(value, Int::new(-5));
    let value: Float = decode(json!(0.25), Codec::Json);
    assert_eq!(value, Float::new(0.25));
    let value: Float = decode(json!(3), Codec::Json);
    assert_eq!(value, Float::new(3.0));
    let value: Str = decode(json!("hello"), Codec::Json);
    assert_eq!(value, Str::new("hello".to_owned()));
}

#[test]
fn empty_payloads_are_null() {
    let value: Str = decode(json!(""), Codec::Json);
    assert_eq!(value.state(), State::Null);
    assert_eq!(value.data(), "");

    let value: StringArray = decode(json!([]), Codec::Json);
    assert_eq!(value.state(), State::Null);
    let value: StringArray = decode(json!([]), Codec::MessagePack);
    assert_eq!(value.state(), State::Null);

    // Empty payload is only checked for strings and arrays
    let value: Int = decode(json!(0), Codec::Json);
    assert_eq!(value, Int::new(0));
    let value: Bool = decode(json!(false), Codec::Json);
    assert_eq!(value, Bool::new(false));
}

#[test]
fn scalar_mismatches_are_absorbed_for_json_and_bson() {
    for codec in [Codec::Json, Codec::Bson] {
        let value: Int = decode(json!("abc"), codec);
        assert_eq!(value.state(), State::Null);
        assert_eq!(*value.data(), 0);

        let value: Int = decode(json!(1.5), codec);
        assert_eq!(value.state(), State::Null);
        let value: Bool = decode(json!("true"), codec);
        assert_eq!(value.state(), State::Null);
        let value: Float = decode(json!([1.0]), codec);
        assert_eq!(value.state(), State::Null);
        let value: Str = decode(json!(123), codec);
        assert_eq!(value.state(), State::Null);
    }
}

#[test]
fn scalar_mismatches_are_propagated_for_msgpack() {
    let err = Int::decode(&json_value(json!("abc")), Codec::MessagePack, &DecodeOptions::default())
        .unwrap_err();
    assert_eq!(err.category(), DecodeErrorCategory::Conversion);
    assert_eq!(err.codec(), Some(Codec::MessagePack));
    assert_eq!(err.payload_type(), Some("i64"));
    let message = err.to_string();
    assert!(message.contains("`i64` from MessagePack"), "{message}");
}

#[test]
fn strict_mode_disables_absorption() {
    let options = DecodeOptions {
        strict: true,
        ..DecodeOptions::default()
    };
    let err = Int::decode(&json_value(json!("abc")), Codec::Json, &options).unwrap_err();
    assert_eq!(err.category(), DecodeErrorCategory::Conversion);
    assert_eq!(err.codec(), Some(Codec::Json));

    // Null markers and empty payloads are still not errors
    let value = Str::decode(&json_value(json!("")), Codec::Json, &options).unwrap();
    assert_eq!(value.state(), State::Null);
    let value = Str::decode(&Value::Null, Codec::Json, &options).unwrap();
    assert_eq!(value.state(), State::Null);
}

#[test]
fn non_scalar_mismatches_are_propagated() {
    let options = DecodeOptions::default();
    let err = StringArray::decode(&json_value(json!("a,b")), Codec::Json, &options).unwrap_err();
    assert_eq!(err.category(), DecodeErrorCategory::Conversion);
    let err = StringArray::decode(&json_value(json!([1, 2])), Codec::Bson, &options).unwrap_err();
    assert_eq!(err.category(), DecodeErrorCategory::Conversion);

    let err = Type::<TestValue>::decode(&json_value(json!({ "id": "?" })), Codec::Json, &options)
        .unwrap_err();
    assert_eq!(err.category(), DecodeErrorCategory::Conversion);
    let message = err.to_string();
    assert!(message.contains("TestValue"), "{message}");

    let err = Time::decode(&json_value(json!("yesterday")), Codec::Json, &options).unwrap_err();
    assert_eq!(err.category(), DecodeErrorCategory::InvalidDate);
    let err = Time::decode(&json_value(json!(1_700_000_000)), Codec::Json, &options).unwrap_err();
    assert_eq!(err.category(), DecodeErrorCategory::Conversion);

    let err = Type::<GeomPoint>::decode(&json_value(json!("zz")), Codec::Json, &options)
        .unwrap_err();
    assert_eq!(err.category(), DecodeErrorCategory::Geometry);
}

#[test]
fn decoding_user_types() {
    let json = json!({
        "id": 42,
        "tags": ["first", "second"],
        "nested": { "name": "inner", "count": 3 },
    });
    let value: Type<TestValue> = decode(json, Codec::Json);
    assert_eq!(value.into_option(), Some(sample_value()));

    // Structs can be decoded from arrays, like with `serde_json`
    let value: Type<TestValue> = decode(json!([1, ["x"], null]), Codec::Json);
    let value = value.into_option().unwrap();
    assert_eq!(value.id, 1);
    assert_eq!(value.nested, None);
}

#[test]
fn decoding_missing_fields() {
    let object = json_value(json!({ "count": 5, "name": null }));
    let object = object.as_object().unwrap();
    let options = DecodeOptions::default();

    let count = Int::decode_field(object.get("count"), Codec::Json, &options).unwrap();
    assert_eq!(count, Int::new(5));
    let name = Str::decode_field(object.get("name"), Codec::Json, &options).unwrap();
    assert_eq!(name.state(), State::Null);
    let flag = Bool::decode_field(object.get("flag"), Codec::Json, &options).unwrap();
    assert_eq!(flag.state(), State::Absent);
}

#[test]
fn deserializer_without_coercion() {
    let options = DecodeOptions::default();
    let value = json_value(json!("42"));
    let err = u32::deserialize(ValueDeserializer::new(&value, &options)).unwrap_err();
    assert!(err.to_string().contains("invalid type"), "{err}");

    let value = json_value(json!(42));
    let err = String::deserialize(ValueDeserializer::new(&value, &options)).unwrap_err();
    assert!(err.to_string().contains("invalid type"), "{err}");
}

#[test]
fn deserializer_with_coercion() {
    let options = DecodeOptions::text();
    let value = json_value(json!(" 42 "));
    assert_eq!(u32::deserialize(ValueDeserializer::new(&value, &options)).unwrap(), 42);
    let value = json_value(json!("0.5"));
    assert_eq!(f64::deserialize(ValueDeserializer::new(&value, &options)).unwrap(), 0.5);
    let value = json_value(json!("off"));
    assert!(!bool::deserialize(ValueDeserializer::new(&value, &options)).unwrap());
    let value = json_value(json!(42));
    assert_eq!(String::deserialize(ValueDeserializer::new(&value, &options)).unwrap(), "42");

    let value = json_value(json!("1, 2,3"));
    let numbers = Vec::<u8>::deserialize(ValueDeserializer::new(&value, &options)).unwrap();
    assert_eq!(numbers, [1, 2, 3]);

    let value = json_value(json!("300"));
    let err = u8::deserialize(ValueDeserializer::new(&value, &options)).unwrap_err();
    assert_matches!(err.category(), DecodeErrorCategory::Conversion);
}

#[test]
fn deserializing_enums() {
    #[derive(Debug, PartialEq, Deserialize)]
    #[serde(rename_all = "snake_case")]
    enum Shape {
        Dot,
        Circle(f64),
        Rect { width: f64, height: f64 },
    }

    let options = DecodeOptions::default();
    let value = json_value(json!("dot"));
    let shape = Shape::deserialize(ValueDeserializer::new(&value, &options)).unwrap();
    assert_eq!(shape, Shape::Dot);

    let value = json_value(json!({ "circle": 2.0 }));
    let shape = Shape::deserialize(ValueDeserializer::new(&value, &options)).unwrap();
    assert_eq!(shape, Shape::Circle(2.0));

    let value = json_value(json!({ "rect": { "width": 1.0, "height": 3.0 } }));
    let shape = Shape::deserialize(ValueDeserializer::new(&value, &options)).unwrap();
    assert_eq!(
        shape,
        Shape::Rect {
            width: 1.0,
            height: 3.0
        }
    );

    let value = json_value(json!({ "circle": 2.0, "dot": null }));
    let err = Shape::deserialize(ValueDeserializer::new(&value, &options)).unwrap_err();
    assert!(err.to_string().contains("single key"), "{err}");
}

#[test]
fn decoding_text() {
    assert_eq!(Int::from_text("42"), Int::new(42));
    assert_eq!(Int::from_text("4x2").state(), State::Null);
    assert_eq!(Int::from_text("").state(), State::Null);
    assert_eq!(Float::from_text("-0.5"), Float::new(-0.5));
    assert_eq!(Bool::from_text("on"), Bool::new(true));
    assert_eq!(Bool::from_text("0"), Bool::new(false));
    assert_eq!(Bool::from_text("maybe").state(), State::Null);
    assert_eq!(Str::from_text("42"), Str::new("42".to_owned()));
    assert_eq!(Str::from_text("").state(), State::Null);
    assert_eq!(Float::from_text("1e3"), Float::new(1_000.0));
    for raw in ["NaN", "inf", "-infinity"] {
        assert_eq!(Float::from_text(raw).state(), State::Null, "{raw}");
    }

    let tags = StringArray::from_text("rust,serde");
    assert_eq!(tags.into_option().unwrap(), ["rust", "serde"]);
    let tags = StringArray::from_text(r#"["a,b", "c"]"#);
    assert_eq!(tags.into_option().unwrap(), ["a,b", "c"]);
    assert_eq!(StringArray::from_text(" , ").state(), State::Null);

    let time = Time::from_text("2024-03-09");
    assert_eq!(time.calendar().unwrap().to_date_string(), "2024-03-09");
    assert_eq!(Time::from_text("next week").state(), State::Null);

    let value = Type::<TestValue>::from_text(r#"{ "id": 5, "tags": [] }"#);
    assert_eq!(value.into_option().unwrap().id, 5);
    assert_eq!(Type::<TestValue>::from_text("5").state(), State::Null);

    let value: Int = "17".parse().unwrap();
    assert_eq!(value, Int::new(17));
}

#[test]
fn text_resembling_json_is_kept_for_strings() {
    for raw in ["[1,2]", r#"{"q":1}"#, "[]", "{oops"] {
        assert_eq!(Str::from_text(raw).as_option().map(String::as_str), Some(raw), "{raw}");
    }
    assert_eq!(Int::from_text("[1]").state(), State::Null);

    let tags = StringArray::from_text("[1,2]");
    assert_eq!(tags.into_option().unwrap(), ["1", "2"]);
}

#[test]
fn non_finite_text_is_not_a_valid_float() {
    let options = DecodeOptions::text();
    let value = Value::String("NaN".into());
    let err = f64::deserialize(ValueDeserializer::new(&value, &options)).unwrap_err();
    assert!(err.to_string().contains("non-finite"), "{err}");

    let float = Float::from_text("inf");
    assert!(!float.is_valid());
    assert_eq!(Float::from_json(&float.to_json().unwrap()).unwrap().state(), State::Null);
}

fn arbitrary_json() -> impl Strategy<Value = serde_json::Value> {
    let leaf = prop_oneof![
        Just(serde_json::Value::Null),
        any::<bool>().prop_map(serde_json::Value::from),
        any::<i64>().prop_map(serde_json::Value::from),
        (-1e9..1e9_f64).prop_map(serde_json::Value::from),
        "[a-z0-9 ,]{0,8}".prop_map(serde_json::Value::from),
    ];
    leaf.prop_recursive(3, 16, 4, |inner| {
        prop_oneof![
            proptest::collection::vec(inner.clone(), 0..4).prop_map(serde_json::Value::Array),
            proptest::collection::btree_map("[a-z]{1,4}", inner, 0..4)
                .prop_map(|map| serde_json::Value::Object(map.into_iter().collect())),
        ]
    })
}

fn assert_invariants<T>(value: &Nullable<T>)
where
    T: crate::Payload + PartialEq + std::fmt::Debug,
{
    assert!(value.is_present());
    if !value.is_valid() {
        assert_eq!(*value.data(), T::default());
        assert_eq!(value.state(), State::Null);
    }
}

proptest! {
    #[test]
    fn decoded_wrappers_uphold_invariants(json in arbitrary_json()) {
        let bytes = serde_json::to_vec(&json).unwrap();
        for codec in [Codec::Json, Codec::MessagePack] {
            let value = json_value(json.clone());
            let options = DecodeOptions::default();
            if let Ok(decoded) = Bool::decode(&value, codec, &options) {
                assert_invariants(&decoded);
            }
            if let Ok(decoded) = Int::decode(&value, codec, &options) {
                assert_invariants(&decoded);
            }
            if let Ok(decoded) = Str::decode(&value, codec, &options) {
                assert_invariants(&decoded);
            }
            if let Ok(decoded) = StringArray::decode(&value, codec, &options) {
                assert_invariants(&decoded);
            }
            if let Ok(decoded) = Type::<TestValue>::decode(&value, codec, &options) {
                assert_invariants(&decoded);
            }
        }

        // Scalars never fail on valid JSON
        Int::from_json(&bytes).unwrap();
        Bool::from_json(&bytes).unwrap();
        Str::from_json(&bytes).unwrap();
    }

    #[test]
    fn text_decoding_never_panics(raw in ".{0,16}") {
        assert_invariants(&Int::from_text(&raw));
        assert_invariants(&Float::from_text(&raw));
        assert_invariants(&StringArray::from_text(&raw));
        assert_invariants(&Time::from_text(&raw));
    }
}
