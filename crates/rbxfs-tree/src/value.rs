//! Typed property values
//!
//! The engine reasons about values only through their type tag; payloads
//! are carried opaquely between decode and encode.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

/// A typed property value.
///
/// `BinaryString` payloads serialize as base64 so that every carrier
/// format (JSON, XML, binary documents) shares one text representation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    String(String),
    ProtectedString(String),
    BinaryString(#[serde(with = "base64_bytes")] Vec<u8>),
    Bool(bool),
    Int32(i32),
    Int64(i64),
    Float32(f32),
    Float64(f64),
    Vector3([f64; 3]),
    /// An object reference carried as its stable referent string.
    Reference(String),
}

impl Value {
    /// The type tag used by rules (`Property(_, _, <type>)` compares the
    /// lowercased form) and by the property-bag formats.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::String(_) => "String",
            Self::ProtectedString(_) => "ProtectedString",
            Self::BinaryString(_) => "BinaryString",
            Self::Bool(_) => "Bool",
            Self::Int32(_) => "Int32",
            Self::Int64(_) => "Int64",
            Self::Float32(_) => "Float32",
            Self::Float64(_) => "Float64",
            Self::Vector3(_) => "Vector3",
            Self::Reference(_) => "Reference",
        }
    }

    /// The referent string if this value is a reference (or a string that
    /// stands in for one in a decoded source).
    pub fn as_referent(&self) -> Option<&str> {
        match self {
            Self::Reference(r) => Some(r),
            Self::String(s) => Some(s),
            _ => None,
        }
    }
}

impl Eq for Value {}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        fn key(v: &Value) -> u32 {
            match v {
                Value::String(_) => 0,
                Value::ProtectedString(_) => 1,
                Value::BinaryString(_) => 2,
                Value::Bool(_) => 3,
                Value::Int32(_) => 4,
                Value::Int64(_) => 5,
                Value::Float32(_) => 6,
                Value::Float64(_) => 7,
                Value::Vector3(_) => 8,
                Value::Reference(_) => 9,
            }
        }

        match (self, other) {
            (Value::String(a), Value::String(b)) => a.cmp(b),
            (Value::ProtectedString(a), Value::ProtectedString(b)) => a.cmp(b),
            (Value::BinaryString(a), Value::BinaryString(b)) => a.cmp(b),
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::Int32(a), Value::Int32(b)) => a.cmp(b),
            (Value::Int64(a), Value::Int64(b)) => a.cmp(b),
            (Value::Float32(a), Value::Float32(b)) => a.total_cmp(b),
            (Value::Float64(a), Value::Float64(b)) => a.total_cmp(b),
            (Value::Vector3(a), Value::Vector3(b)) => a
                .iter()
                .zip(b.iter())
                .map(|(x, y)| x.total_cmp(y))
                .find(|o| *o != Ordering::Equal)
                .unwrap_or(Ordering::Equal),
            (Value::Reference(a), Value::Reference(b)) => a.cmp(b),
            _ => key(self).cmp(&key(other)),
        }
    }
}

mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let text = String::deserialize(deserializer)?;
        STANDARD
            .decode(text.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_names() {
        assert_eq!(Value::String("x".into()).type_name(), "String");
        assert_eq!(Value::ProtectedString("x".into()).type_name(), "ProtectedString");
        assert_eq!(Value::BinaryString(vec![1]).type_name(), "BinaryString");
        assert_eq!(Value::Reference("RBX0".into()).type_name(), "Reference");
    }

    #[test]
    fn test_binary_string_roundtrips_as_base64() {
        let value = Value::BinaryString(vec![0, 1, 2, 255]);
        let json = serde_json::to_string(&value).unwrap();
        assert!(json.contains("AAEC/w=="), "payload should be base64: {json}");
        let back: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(back, value);
    }

    #[test]
    fn test_as_referent() {
        assert_eq!(Value::Reference("RBX1".into()).as_referent(), Some("RBX1"));
        assert_eq!(Value::String("RBX1".into()).as_referent(), Some("RBX1"));
        assert_eq!(Value::Bool(true).as_referent(), None);
    }
}
