//! Test-only functionality shared among multiple test modules.

use serde::{Deserialize, Serialize};

use crate::{
    Bool, Float, GeomPoint, Int, Payload, Str, StringArray, Time, Type,
    value::Value,
};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub(crate) struct NestedValue {
    pub(crate) name: String,
    #[serde(default)]
    pub(crate) count: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub(crate) struct TestValue {
    pub(crate) id: u64,
    pub(crate) tags: Vec<String>,
    #[serde(default)]
    pub(crate) nested: Option<NestedValue>,
}

impl Payload for TestValue {}

/// Record with a field of each supported wrapper.
#[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
pub(crate) struct Record {
    #[serde(default, skip_serializing_if = "Bool::is_absent")]
    pub(crate) flag: Bool,
    #[serde(default, skip_serializing_if = "Int::is_absent")]
    pub(crate) count: Int,
    #[serde(default, skip_serializing_if = "Float::is_absent")]
    pub(crate) ratio: Float,
    #[serde(default, skip_serializing_if = "Str::is_absent")]
    pub(crate) name: Str,
    #[serde(default, skip_serializing_if = "StringArray::is_absent")]
    pub(crate) tags: StringArray,
    #[serde(default, skip_serializing_if = "Time::is_absent")]
    pub(crate) updated_at: Time,
    #[serde(default, skip_serializing_if = "Type::is_absent")]
    pub(crate) value: Type<TestValue>,
    #[serde(default, skip_serializing_if = "Type::is_absent")]
    pub(crate) location: Type<GeomPoint>,
}

pub(crate) fn json_value(json: serde_json::Value) -> Value {
    Value::from(json)
}

pub(crate) fn sample_value() -> TestValue {
    TestValue {
        id: 42,
        tags: vec!["first".into(), "second".into()],
        nested: Some(NestedValue {
            name: "inner".into(),
            count: 3,
        }),
    }
}
