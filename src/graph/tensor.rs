//! Tensor descriptors and embedded tensor constants.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::StructuralError;

/// Element types a tensor can carry.
///
/// Codes follow the `TensorProto.DataType` numbering of the ONNX format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ElementType {
    Float,
    Uint8,
    Int8,
    Int32,
    Int64,
    String,
    Bool,
    Double,
}

impl ElementType {
    /// Returns the ONNX `TensorProto.DataType` code.
    pub const fn onnx_code(self) -> i32 {
        match self {
            Self::Float => 1,
            Self::Uint8 => 2,
            Self::Int8 => 3,
            Self::Int32 => 6,
            Self::Int64 => 7,
            Self::String => 8,
            Self::Bool => 9,
            Self::Double => 11,
        }
    }

    /// Inverse of [`ElementType::onnx_code`].
    pub const fn from_onnx_code(code: i32) -> Option<Self> {
        match code {
            1 => Some(Self::Float),
            2 => Some(Self::Uint8),
            3 => Some(Self::Int8),
            6 => Some(Self::Int32),
            7 => Some(Self::Int64),
            8 => Some(Self::String),
            9 => Some(Self::Bool),
            11 => Some(Self::Double),
            _ => None,
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Float => "FLOAT",
            Self::Uint8 => "UINT8",
            Self::Int8 => "INT8",
            Self::Int32 => "INT32",
            Self::Int64 => "INT64",
            Self::String => "STRING",
            Self::Bool => "BOOL",
            Self::Double => "DOUBLE",
        };
        f.write_str(s)
    }
}

/// A single dimension of a declared shape.
///
/// Serializes as a number for fixed dimensions and `null` for unbound ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Dim {
    Fixed(i64),
    Unbound,
}

impl Dim {
    /// Two dimensions are compatible when either is unbound or both are equal.
    pub fn is_compatible(self, other: Dim) -> bool {
        match (self, other) {
            (Dim::Fixed(a), Dim::Fixed(b)) => a == b,
            _ => true,
        }
    }
}

impl From<i64> for Dim {
    fn from(value: i64) -> Self {
        Dim::Fixed(value)
    }
}

/// A named, typed, shaped value placeholder used for graph inputs and outputs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TensorDescriptor {
    name: String,
    element_type: ElementType,
    shape: Vec<Dim>,
}

impl TensorDescriptor {
    /// Creates a descriptor, rejecting blank names.
    pub fn new(
        name: impl Into<String>,
        element_type: ElementType,
        shape: Vec<Dim>,
    ) -> Result<Self, StructuralError> {
        let desc = Self {
            name: name.into(),
            element_type,
            shape,
        };
        desc.check()?;
        Ok(desc)
    }

    /// Re-runs the construction checks on a deserialized descriptor.
    pub(crate) fn check(&self) -> Result<(), StructuralError> {
        if self.name.trim().is_empty() {
            return Err(StructuralError::BlankName { what: "Tensor" });
        }
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn element_type(&self) -> ElementType {
        self.element_type
    }

    pub fn shape(&self) -> &[Dim] {
        &self.shape
    }

    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    /// Whether a value described by `self` may flow into a slot described by
    /// `other`: same element type, same rank, pairwise compatible dimensions.
    pub fn is_compatible_with(&self, other: &TensorDescriptor) -> bool {
        self.element_type == other.element_type
            && self.shape.len() == other.shape.len()
            && self
                .shape
                .iter()
                .zip(other.shape.iter())
                .all(|(a, b)| a.is_compatible(*b))
    }

    pub(crate) fn renamed(&self, name: &str) -> Self {
        Self {
            name: name.to_string(),
            element_type: self.element_type,
            shape: self.shape.clone(),
        }
    }
}

/// Payload of an embedded tensor constant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "values", rename_all = "UPPERCASE")]
pub enum TensorData {
    Float(Vec<f32>),
    Int64(Vec<i64>),
    String(Vec<String>),
}

impl TensorData {
    pub fn len(&self) -> usize {
        match self {
            TensorData::Float(v) => v.len(),
            TensorData::Int64(v) => v.len(),
            TensorData::String(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn element_type(&self) -> ElementType {
        match self {
            TensorData::Float(_) => ElementType::Float,
            TensorData::Int64(_) => ElementType::Int64,
            TensorData::String(_) => ElementType::String,
        }
    }
}

/// A constant tensor embedded in a node attribute (e.g. `Constant.value`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TensorConstant {
    name: String,
    dims: Vec<i64>,
    data: TensorData,
}

impl TensorConstant {
    /// Creates a constant, checking that `dims` accounts for every element.
    pub fn new(
        name: impl Into<String>,
        dims: Vec<i64>,
        data: TensorData,
    ) -> Result<Self, StructuralError> {
        let constant = Self {
            name: name.into(),
            dims,
            data,
        };
        constant.check()?;
        Ok(constant)
    }

    /// Re-runs the construction checks on a deserialized constant.
    ///
    /// Negative or overflowing dims report `expected` as `usize::MAX`.
    pub(crate) fn check(&self) -> Result<(), StructuralError> {
        let expected = if self.dims.iter().any(|d| *d < 0) {
            None
        } else {
            self.dims
                .iter()
                .try_fold(1i64, |acc, d| acc.checked_mul(*d))
                .and_then(|n| usize::try_from(n).ok())
        };
        if expected == Some(self.data.len()) {
            return Ok(());
        }
        Err(StructuralError::ConstantLength {
            name: self.name.clone(),
            expected: expected.unwrap_or(usize::MAX),
            actual: self.data.len(),
        })
    }

    /// Convenience constructor for a rank-1 int64 constant.
    pub fn int64_vector(name: impl Into<String>, values: Vec<i64>) -> Result<Self, StructuralError> {
        let dims = vec![values.len() as i64];
        Self::new(name, dims, TensorData::Int64(values))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dims(&self) -> &[i64] {
        &self.dims
    }

    pub fn data(&self) -> &TensorData {
        &self.data
    }

    pub fn element_type(&self) -> ElementType {
        self.data.element_type()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_descriptor_name_rejected() {
        let result = TensorDescriptor::new("  ", ElementType::String, vec![Dim::Fixed(1)]);
        assert!(matches!(result, Err(StructuralError::BlankName { .. })));
    }

    #[test]
    fn test_unbound_dim_is_compatible_with_fixed() {
        assert!(Dim::Unbound.is_compatible(Dim::Fixed(3)));
        assert!(Dim::Fixed(3).is_compatible(Dim::Fixed(3)));
        assert!(!Dim::Fixed(3).is_compatible(Dim::Fixed(4)));
    }

    #[test]
    fn test_descriptor_compatibility_checks_type_and_rank() {
        let tokens =
            TensorDescriptor::new("a", ElementType::String, vec![Dim::Fixed(1), Dim::Unbound])
                .unwrap();
        let same = TensorDescriptor::new("b", ElementType::String, vec![Dim::Fixed(1), Dim::Fixed(7)])
            .unwrap();
        let ints = TensorDescriptor::new("c", ElementType::Int64, vec![Dim::Fixed(1), Dim::Unbound])
            .unwrap();
        let flat = TensorDescriptor::new("d", ElementType::String, vec![Dim::Fixed(1)]).unwrap();

        assert!(tokens.is_compatible_with(&same));
        assert!(!tokens.is_compatible_with(&ints));
        assert!(!tokens.is_compatible_with(&flat));
    }

    #[test]
    fn test_constant_length_must_match_dims() {
        let ok = TensorConstant::new("pads", vec![4], TensorData::Int64(vec![0, 0, 0, 3]));
        assert!(ok.is_ok());

        let bad = TensorConstant::new("pads", vec![2, 2], TensorData::Int64(vec![0, 0, 0]));
        assert!(matches!(
            bad,
            Err(StructuralError::ConstantLength {
                expected: 4,
                actual: 3,
                ..
            })
        ));
    }

    #[test]
    fn test_overflowing_dims_rejected() {
        let result = TensorConstant::new("huge", vec![i64::MAX, 4], TensorData::Int64(vec![0]));
        assert!(matches!(
            result,
            Err(StructuralError::ConstantLength {
                expected: usize::MAX,
                actual: 1,
                ..
            })
        ));

        let negative = TensorConstant::new("neg", vec![-1, -1], TensorData::Int64(vec![0]));
        assert!(matches!(negative, Err(StructuralError::ConstantLength { .. })));
    }

    #[test]
    fn test_onnx_codes_round_trip() {
        for ty in [
            ElementType::Float,
            ElementType::Int64,
            ElementType::String,
            ElementType::Bool,
        ] {
            assert_eq!(ElementType::from_onnx_code(ty.onnx_code()), Some(ty));
        }
        assert_eq!(ElementType::from_onnx_code(42), None);
    }

    #[test]
    fn test_dim_serializes_as_number_or_null() {
        let json = serde_json::to_string(&vec![Dim::Fixed(1), Dim::Unbound]).unwrap();
        assert_eq!(json, "[1,null]");
        let back: Vec<Dim> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, vec![Dim::Fixed(1), Dim::Unbound]);
    }
}
