//! Errors raised when importing a protobuf model.

use thiserror::Error;

/// A `ModelProto` that cannot be represented as a [`Model`](crate::graph::Model).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OnnxError {
    #[error("ModelProto has no graph")]
    MissingGraph,

    #[error("Value {name} has no tensor type")]
    MissingTensorType { name: String },

    #[error("Unknown element type code {code} on {name}")]
    UnknownElementType { name: String, code: i32 },

    #[error("Attribute {name} has unsupported type {kind}")]
    UnsupportedAttribute { name: String, kind: i32 },

    #[error("Tensor {name} stores element type {code}, which cannot be embedded")]
    UnsupportedTensorData { name: String, code: i32 },

    #[error("Tensor {name} raw data is {len} bytes, not a multiple of {width}")]
    RawDataLength { name: String, len: usize, width: usize },

    #[error("{name} holds invalid UTF-8")]
    InvalidUtf8 { name: String },
}
