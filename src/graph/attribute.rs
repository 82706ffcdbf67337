//! Node attribute values.

use serde::{Deserialize, Serialize};

use super::tensor::TensorConstant;

/// A literal attribute value attached to a [`Node`](super::Node).
///
/// Variant names follow the ONNX `AttributeType` tags so the JSON export reads
/// the same as the protobuf one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "UPPERCASE")]
pub enum AttributeValue {
    Int(i64),
    Float(f32),
    String(String),
    Ints(Vec<i64>),
    Floats(Vec<f32>),
    Strings(Vec<String>),
    Tensor(TensorConstant),
}

impl AttributeValue {
    /// Returns the ONNX attribute type name.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Int(_) => "INT",
            Self::Float(_) => "FLOAT",
            Self::String(_) => "STRING",
            Self::Ints(_) => "INTS",
            Self::Floats(_) => "FLOATS",
            Self::Strings(_) => "STRINGS",
            Self::Tensor(_) => "TENSOR",
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_ints(&self) -> Option<&[i64]> {
        match self {
            Self::Ints(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_strings(&self) -> Option<&[String]> {
        match self {
            Self::Strings(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_tensor(&self) -> Option<&TensorConstant> {
        match self {
            Self::Tensor(v) => Some(v),
            _ => None,
        }
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f32> for AttributeValue {
    fn from(value: f32) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<Vec<i64>> for AttributeValue {
    fn from(value: Vec<i64>) -> Self {
        Self::Ints(value)
    }
}

impl From<Vec<f32>> for AttributeValue {
    fn from(value: Vec<f32>) -> Self {
        Self::Floats(value)
    }
}

impl From<Vec<String>> for AttributeValue {
    fn from(value: Vec<String>) -> Self {
        Self::Strings(value)
    }
}

impl From<TensorConstant> for AttributeValue {
    fn from(value: TensorConstant) -> Self {
        Self::Tensor(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversions_pick_matching_variant() {
        assert_eq!(AttributeValue::from(3i64).as_int(), Some(3));
        assert_eq!(AttributeValue::from("LOWER").as_str(), Some("LOWER"));
        assert_eq!(
            AttributeValue::from(vec!["a".to_string()]).as_strings(),
            Some(&["a".to_string()][..])
        );
        assert_eq!(AttributeValue::from(vec![1i64, 2]).kind(), "INTS");
    }

    #[test]
    fn test_accessors_reject_other_variants() {
        let value = AttributeValue::Ints(vec![1, 2]);
        assert!(value.as_int().is_none());
        assert!(value.as_str().is_none());
        assert!(value.as_tensor().is_none());
    }

    #[test]
    fn test_json_uses_onnx_type_tags() {
        let json = serde_json::to_string(&AttributeValue::Int(0)).unwrap();
        assert_eq!(json, r#"{"type":"INT","value":0}"#);
    }
}
