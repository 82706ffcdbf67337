//! Training boundary.
//!
//! The graph builders never depend on this module. It defines how a training
//! job consumes a dataset artifact and hyperparameters and hands back model
//! bytes:
//! - [`Hyperparameters`] and [`HyperValue`] for named configuration values
//! - [`Dataset`] for the serialized training data
//! - [`TrainableModel`] and [`do_train`] for the train, validate, serialize flow

mod config;
mod dataset;
mod trainer;

pub use config::{HyperValue, Hyperparameters};
pub use dataset::{Dataset, Sample};
pub use trainer::{DummyArtifact, DummyModel, TrainableModel, do_train};
