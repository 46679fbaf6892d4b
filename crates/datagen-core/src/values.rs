//! Generated value tree.
//!
//! [`Value`] is the type-agnostic output of the generator; one variant per
//! schema variant's output shape. A union node produces its chosen member's
//! value directly, so there is no union variant here.

use serde_json::{Map, Number, Value as JsonValue};
use std::collections::BTreeMap;

/// A single generated value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Null value
    Null,

    /// Boolean value
    Boolean(bool),

    /// 32-bit signed integer
    Int(i32),

    /// 64-bit signed integer
    Long(i64),

    /// 32-bit IEEE float
    Float(f32),

    /// 64-bit IEEE float
    Double(f64),

    /// Variable-length binary data
    Bytes(Vec<u8>),

    /// UTF-8 text
    String(String),

    /// An enum symbol, identified by its position in the declared symbol list
    Enum {
        /// Index into the schema's ordered symbols
        ordinal: usize,
        /// The symbol itself
        symbol: String,
    },

    /// Fixed-size binary data
    Fixed(Vec<u8>),

    /// Ordered sequence of values
    Array(Vec<Value>),

    /// String-keyed mapping
    Map(BTreeMap<String, Value>),

    /// Named record with fields in declared order
    Record {
        /// Record type name
        name: String,
        /// Field values in declared order
        fields: Vec<(String, Value)>,
    },
}

impl Value {
    /// Check if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Try to get this value as a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(value) => Some(*value),
            _ => None,
        }
    }

    /// Try to get this value as an i32.
    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Self::Int(value) => Some(*value),
            _ => None,
        }
    }

    /// Try to get this value as an i64.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(value) => Some(*value as i64),
            Self::Long(value) => Some(*value),
            _ => None,
        }
    }

    /// Try to get this value as an f32.
    pub fn as_f32(&self) -> Option<f32> {
        match self {
            Self::Float(value) => Some(*value),
            _ => None,
        }
    }

    /// Try to get this value as an f64.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(value) => Some(*value as f64),
            Self::Double(value) => Some(*value),
            _ => None,
        }
    }

    /// Try to get this value as a string reference.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(value) => Some(value),
            _ => None,
        }
    }

    /// Try to get this value as binary data (bytes or fixed).
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(value) | Self::Fixed(value) => Some(value),
            _ => None,
        }
    }

    /// Look up a record field by name.
    pub fn field(&self, name: &str) -> Option<&Value> {
        match self {
            Self::Record { fields, .. } => fields
                .iter()
                .find(|(field, _)| field == name)
                .map(|(_, value)| value),
            _ => None,
        }
    }

    /// Project this value to JSON.
    ///
    /// Binary data is rendered the way the Avro JSON encoding renders it:
    /// one ISO-8859-1 character per byte. Enum symbols become plain strings,
    /// records and maps become objects. Non-finite floats become JSON null.
    pub fn to_json(&self) -> JsonValue {
        match self {
            Self::Null => JsonValue::Null,
            Self::Boolean(value) => JsonValue::Bool(*value),
            Self::Int(value) => JsonValue::Number((*value).into()),
            Self::Long(value) => JsonValue::Number((*value).into()),
            Self::Float(value) => Number::from_f64(*value as f64)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            Self::Double(value) => Number::from_f64(*value)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            Self::Bytes(bytes) | Self::Fixed(bytes) => {
                JsonValue::String(bytes.iter().map(|&byte| byte as char).collect())
            }
            Self::String(value) => JsonValue::String(value.clone()),
            Self::Enum { symbol, .. } => JsonValue::String(symbol.clone()),
            Self::Array(values) => JsonValue::Array(values.iter().map(Value::to_json).collect()),
            Self::Map(entries) => JsonValue::Object(
                entries
                    .iter()
                    .map(|(key, value)| (key.clone(), value.to_json()))
                    .collect::<Map<_, _>>(),
            ),
            Self::Record { fields, .. } => JsonValue::Object(
                fields
                    .iter()
                    .map(|(name, value)| (name.clone(), value.to_json()))
                    .collect::<Map<_, _>>(),
            ),
        }
    }
}
