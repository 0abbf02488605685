//! Integration tests for `nullable`.

use nullable::{
    Bool, Codec, DecodeOptions, Dialect, FromText, Int, Payload, State, Str, StringArray, Time,
    Type, value::Value,
};
use serde::{Deserialize, Serialize};

#[test]
fn readme_is_in_sync() {
    version_sync::assert_markdown_deps_updated!("README.md");
}

#[test]
fn html_root_url_is_in_sync() {
    version_sync::assert_html_root_url_updated!("src/lib.rs");
}

#[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
struct Contact {
    email: String,
    verified: bool,
}

impl Payload for Contact {}

#[derive(Debug, Default, Serialize, Deserialize)]
struct UserPatch {
    #[serde(default, skip_serializing_if = "Str::is_absent")]
    name: Str,
    #[serde(default, skip_serializing_if = "Int::is_absent")]
    age: Int,
    #[serde(default, skip_serializing_if = "Bool::is_absent")]
    active: Bool,
    #[serde(default, skip_serializing_if = "StringArray::is_absent")]
    roles: StringArray,
    #[serde(default, skip_serializing_if = "Time::is_absent")]
    last_seen: Time,
    #[serde(default, skip_serializing_if = "Type::is_absent")]
    contact: Type<Contact>,
}

/// Applies a patch to a stored value, following the usual partial update semantics.
fn apply<T: Clone>(field: &nullable::Nullable<T>, stored: &mut Option<T>) {
    match field.state() {
        State::Absent => {}
        State::Null => *stored = None,
        State::Valid => *stored = field.as_option().cloned(),
    }
}

#[test]
fn applying_partial_updates() {
    let patch: UserPatch = serde_json::from_str(
        r#"{
            "name": "Alice",
            "age": null,
            "roles": ["admin"],
            "contact": { "email": "alice@example.com", "verified": true }
        }"#,
    )
    .unwrap();

    let mut name = Some("Bob".to_owned());
    let mut age = Some(30);
    let mut active = Some(true);
    apply(&patch.name, &mut name);
    apply(&patch.age, &mut age);
    apply(&patch.active, &mut active);
    assert_eq!(name.as_deref(), Some("Alice"));
    assert_eq!(age, None);
    assert_eq!(active, Some(true));
    assert_eq!(patch.last_seen.state(), State::Absent);
    assert!(patch.contact.as_option().unwrap().verified);

    let json = serde_json::to_value(&patch).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "name": "Alice",
            "age": null,
            "roles": ["admin"],
            "contact": { "email": "alice@example.com", "verified": true },
        })
    );
}

#[test]
fn decoding_the_same_input_with_different_codecs() {
    let json = serde_json::json!({ "age": "unknown", "name": "" });
    let bytes = serde_json::to_vec(&json).unwrap();
    let patch: UserPatch = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(patch.age.state(), State::Null);
    assert_eq!(patch.name.state(), State::Null);

    let bytes = rmp_serde::to_vec_named(&json).unwrap();
    let err = rmp_serde::from_slice::<UserPatch>(&bytes).unwrap_err();
    assert!(err.to_string().contains("i64"), "{err}");

    let document = bson::to_document(&json).unwrap();
    let age = Int::from_bson_field(&document, "age").unwrap();
    assert_eq!(age.state(), State::Null);
    let missing = Int::from_bson_field(&document, "missing").unwrap();
    assert_eq!(missing.state(), State::Absent);
}

#[test]
fn strict_decoding() {
    let options = DecodeOptions {
        strict: true,
        ..DecodeOptions::default()
    };
    let err = Int::from_json_with(br#""unknown""#, &options).unwrap_err();
    assert_eq!(err.codec(), Some(Codec::Json));

    let value = Value::from(serde_json::json!(5));
    let decoded = Int::decode(&value, Codec::Bson, &options).unwrap();
    assert_eq!(decoded, Int::new(5));
}

#[test]
fn query_string_values() {
    let params = [("age", "42"), ("active", "yes"), ("roles", "admin,editor"), ("name", "")];
    let lookup = |key: &str| params.iter().find(|(k, _)| *k == key).map(|(_, v)| *v);

    let age = lookup("age").map_or_else(Int::absent, Int::from_text);
    assert_eq!(age, Int::new(42));
    let active = lookup("active").map_or_else(Bool::absent, Bool::from_text);
    assert_eq!(active, Bool::new(true));
    let roles = lookup("roles").map_or_else(StringArray::absent, StringArray::from_text);
    assert_eq!(roles.as_option().unwrap(), &["admin", "editor"]);
    let name = lookup("name").map_or_else(Str::absent, Str::from_text);
    assert_eq!(name.state(), State::Null);
    let last_seen = lookup("last_seen").map_or_else(Time::absent, Time::from_text);
    assert_eq!(last_seen.state(), State::Absent);
}

#[test]
fn schema_hints() {
    assert_eq!(Type::<Contact>::data_type(), "json");
    assert_eq!(Type::<Contact>::column_type(Dialect::Postgres), "JSONB");
    let dialect: Dialect = "postgres".parse().unwrap();
    assert_eq!(StringArray::column_type(dialect), "text[]");
}
