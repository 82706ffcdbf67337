//! ONNX protobuf export and import.
//!
//! [`to_model_proto`] lowers a [`Model`](crate::graph::Model) into the message
//! tree defined in [`proto`]; [`from_model_proto`] goes the other way and
//! re-validates the result.

pub mod proto;

mod export;

pub use export::{from_bytes, from_model_proto, to_model_proto};
