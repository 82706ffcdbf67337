//! Format versions and operator domains shared by every builder.

use crate::graph::OpsetId;

/// Versions stamped onto every exported model.
pub struct OnnxVersion;

impl OnnxVersion {
    /// ONNX IR format version.
    pub const IR_VERSION: i64 = 8;
    /// Opset version of the default (`""`) domain.
    pub const OPSET_VERSION: i64 = 17;
}

/// The default ONNX operator domain.
pub const DEFAULT_DOMAIN: &str = "";
/// Traditional-ML operators (`CategoryMapper`).
pub const ML_DOMAIN: &str = "ai.onnx.ml";
/// ONNX Runtime contrib operators (`Tokenizer`).
pub const MICROSOFT_DOMAIN: &str = "com.microsoft";

/// Opset imports declared by the tokenizer, mapper and numericalizer models.
pub fn default_opset_imports() -> Vec<OpsetId> {
    vec![
        OpsetId::new(ML_DOMAIN, 1),
        OpsetId::new(MICROSOFT_DOMAIN, 1),
        OpsetId::new(DEFAULT_DOMAIN, OnnxVersion::OPSET_VERSION),
    ]
}
