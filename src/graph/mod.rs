//! Graph IR: tensors, nodes, graphs, models, and graph composition.
//!
//! The types here mirror the ONNX graph model closely enough to be exported
//! one-to-one (see [`crate::onnx`]), while checking naming and ordering
//! invariants at construction time.
//!
//! # Example
//!
//! ```
//! use numericalizer::graph::{Dim, ElementType, Graph, Model, Node, TensorDescriptor};
//!
//! let mut assembler = Graph::assembler("normalize");
//! assembler
//!     .add_input(TensorDescriptor::new("raw", ElementType::String, vec![Dim::Fixed(1), Dim::Unbound]).unwrap())
//!     .unwrap();
//! assembler
//!     .add_node(
//!         Node::new("StringNormalizer", ["raw"], ["clean"])
//!             .unwrap()
//!             .with_attr("case_change_action", "LOWER"),
//!     )
//!     .unwrap();
//! assembler.add_output(TensorDescriptor::new("clean", ElementType::String, vec![Dim::Fixed(1), Dim::Unbound]).unwrap());
//!
//! let model = Model::with_default_opsets(assembler.finish().unwrap()).unwrap();
//! assert_eq!(model.opset_version(""), Some(17));
//! ```

mod attribute;
mod compose;
mod core;
mod model;
mod node;
mod tensor;

pub use attribute::AttributeValue;
pub use compose::{PortMap, merge_graphs, merge_models, merge_opsets};
pub use self::core::{Graph, GraphAssembler};
pub use model::{Model, OpsetId};
pub use node::Node;
pub use tensor::{Dim, ElementType, TensorConstant, TensorData, TensorDescriptor};
