//! Error types for graph construction, composition, and export.

mod graph_error;
mod onnx_error;
mod training_error;

pub use graph_error::{CompositionError, ConfigError, StructuralError};
pub use onnx_error::OnnxError;
pub use training_error::TrainingError;

use thiserror::Error;

/// Top-level error for operations that span several stages, such as compiling
/// a [`PipelineConfig`](crate::config::PipelineConfig) or exporting a model.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Structural(#[from] StructuralError),

    #[error(transparent)]
    Composition(#[from] CompositionError),

    #[error(transparent)]
    Eval(#[from] crate::reference::EvalError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("ONNX encode error: {0}")]
    Encode(#[from] prost::EncodeError),

    #[error("ONNX decode error: {0}")]
    Decode(#[from] prost::DecodeError),

    #[error(transparent)]
    Onnx(#[from] OnnxError),

    #[error(transparent)]
    Training(#[from] TrainingError),
}
