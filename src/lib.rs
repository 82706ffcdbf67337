//! # onnx-numericalizer
//!
//! Compiles declarative text-preprocessing pipelines into portable ONNX
//! computation graphs.
//!
//! A pipeline turns one raw string into a fixed-width vector of integer token
//! ids. It is assembled from two graphs: a tokenizer (split, drop stopwords,
//! change case) and a mapper (vocabulary lookup, then pad and slice to a fixed
//! width). The two graphs are spliced into a single self-contained model.
//!
//! ## Features
//!
//! - **Typed graph model**: tensors, nodes, graphs and models validate their
//!   structure on construction.
//! - **Graph composition**: splice any two models through an explicit port map.
//! - **Export**: JSON via serde, and the ONNX protobuf wire format via prost.
//! - **Reference evaluator**: run a compiled model in-process to check wiring.
//!
//! ## Example
//!
//! ```
//! use numericalizer::prelude::*;
//!
//! let vocabulary = Vocabulary::new([("cat", 2), ("dog", 3)]).unwrap();
//! let mapper = Mapper::new(MapperConfig::new(vocabulary).output_vector_length(5)).unwrap();
//! let model = Numericalizer::new(Tokenizer::default(), mapper)
//!     .build()
//!     .expect("Failed to build model");
//!
//! let ids = numericalizer::reference::evaluate_text(&model, "Cat dog fox").unwrap();
//! assert_eq!(ids.as_int64().unwrap(), [2, 3, 1, 0, 0]);
//!
//! let bytes = model.to_onnx_bytes();
//! assert!(!bytes.is_empty());
//! ```

pub mod builders;
pub mod config;
pub mod constants;
pub mod errors;
pub mod graph;
pub mod onnx;
pub mod reference;
pub mod training;

// Re-exports for convenience
pub use builders::{Mapper, MapperConfig, Numericalizer, Tokenizer, TokenizerConfig, Vocabulary};
pub use config::PipelineConfig;
pub use errors::Error;
pub use graph::Model;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::builders::{
        CaseChangeAction, Mapper, MapperConfig, Numericalizer, Tokenizer, TokenizerConfig,
        Vocabulary,
    };
    pub use crate::config::PipelineConfig;
    pub use crate::errors::{CompositionError, ConfigError, Error, StructuralError};
    pub use crate::graph::{Graph, Model, PortMap, merge_models};
}
