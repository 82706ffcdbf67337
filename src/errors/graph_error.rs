//! Graph-related error types.

use thiserror::Error;

use crate::graph::{Dim, ElementType};

/// Invalid builder configuration. Raised when a builder is constructed or
/// reconfigured, never from `build()`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Invalid case change action: {action} (expected LOWER, UPPER or NONE)")]
    InvalidCaseChangeAction { action: String },

    #[error("At least one separator is required")]
    NoSeparators,

    #[error("Separators cannot be empty strings")]
    EmptySeparator,

    #[error("Vocabulary cannot be empty")]
    EmptyVocabulary,

    #[error("Vocabulary id {id} for token {token:?} is reserved; ids must be >= 2")]
    ReservedVocabularyId { token: String, id: i64 },

    #[error("Out-of-vocabulary token must be -1, 0 or 1, got {value}")]
    InvalidOovToken { value: i64 },

    #[error("Output vector length must be a positive integer, got {value}")]
    InvalidOutputLength { value: i64 },
}

/// Internal invariant violation while assembling a graph.
///
/// These point at a builder bug: the builders in this crate never produce them
/// for a valid configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StructuralError {
    #[error("{what} name cannot be blank")]
    BlankName { what: &'static str },

    #[error("Node {op_type} declares no outputs")]
    NoOutputs { op_type: String },

    #[error("Duplicate tensor name: {name}")]
    DuplicateTensor { name: String },

    #[error("Node {op_type} references undefined tensor {name}")]
    DanglingInput { op_type: String, name: String },

    #[error("Constant {name} declares {expected} elements but holds {actual}")]
    ConstantLength {
        name: String,
        expected: usize,
        actual: usize,
    },

    #[error("Graph output {name} is not produced by any node or input")]
    UnproducedOutput { name: String },

    #[error("No opset requirement declared for domain {domain:?}")]
    MissingOpset { domain: String },

    #[error("Opset domain {domain:?} declared more than once")]
    DuplicateOpset { domain: String },
}

/// Failure while splicing two graphs or models together.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompositionError {
    #[error("Port map is empty")]
    EmptyPortMap,

    #[error("Producer graph {graph} has no declared output {name}")]
    MissingOutputPort { graph: String, name: String },

    #[error("Consumer graph {graph} has no declared input {name}")]
    MissingInputPort { graph: String, name: String },

    #[error("Port {name} is mapped more than once")]
    DuplicatePort { name: String },

    #[error(
        "Incompatible port {producer} -> {consumer}: {producer_type}{producer_shape:?} vs {consumer_type}{consumer_shape:?}"
    )]
    IncompatiblePort {
        producer: String,
        consumer: String,
        producer_type: ElementType,
        producer_shape: Vec<Dim>,
        consumer_type: ElementType,
        consumer_shape: Vec<Dim>,
    },

    #[error("Tensor name {name} collides after merge")]
    NameCollision { name: String },

    #[error("Opset domain {domain:?} required at incompatible versions {left} and {right}")]
    OpsetConflict { domain: String, left: i64, right: i64 },

    #[error("IR versions differ: {left} vs {right}")]
    IrVersionMismatch { left: i64, right: i64 },

    #[error(transparent)]
    Structural(#[from] StructuralError),
}
