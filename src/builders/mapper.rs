//! Mapper graph builder: tokens to a fixed-width vector of vocabulary ids.

use serde::{Deserialize, Serialize};

use super::vocabulary::{OOV_SENTINELS, Vocabulary};
use crate::constants::{ML_DOMAIN, OnnxVersion, default_opset_imports};
use crate::errors::{ConfigError, StructuralError};
use crate::graph::{Dim, ElementType, Graph, Model, Node, TensorConstant, TensorDescriptor};

/// Name of the token input.
pub const INPUT_NAME: &str = "string_normalized";
/// Name of the fixed-width id output.
pub const OUTPUT_NAME: &str = "numeric_tensor";

const DEFAULT_OOV_TOKEN: i64 = 1;
const DEFAULT_OUTPUT_LENGTH: i64 = 15;

fn default_oov_token() -> i64 {
    DEFAULT_OOV_TOKEN
}

fn default_output_length() -> i64 {
    DEFAULT_OUTPUT_LENGTH
}

/// Configuration for a [`Mapper`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapperConfig {
    /// Token to id table.
    pub vocabulary: Vocabulary,
    /// Id emitted for tokens missing from the vocabulary: -1, 0 or 1.
    #[serde(default = "default_oov_token")]
    pub oov_token: i64,
    /// Width of the output vector.
    #[serde(default = "default_output_length")]
    pub output_vector_length: i64,
}

impl MapperConfig {
    /// Creates a MapperConfig with the default OOV id (1) and length (15).
    pub fn new(vocabulary: Vocabulary) -> Self {
        Self {
            vocabulary,
            oov_token: DEFAULT_OOV_TOKEN,
            output_vector_length: DEFAULT_OUTPUT_LENGTH,
        }
    }

    /// Sets the out-of-vocabulary id.
    pub fn oov_token(mut self, oov_token: i64) -> Self {
        self.oov_token = oov_token;
        self
    }

    /// Sets the output vector length.
    pub fn output_vector_length(mut self, length: i64) -> Self {
        self.output_vector_length = length;
        self
    }

    fn validate(&self) -> Result<(), ConfigError> {
        validate_oov_token(self.oov_token)?;
        validate_output_length(self.output_vector_length)
    }
}

fn validate_oov_token(value: i64) -> Result<(), ConfigError> {
    if OOV_SENTINELS.contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::InvalidOovToken { value })
    }
}

fn validate_output_length(value: i64) -> Result<(), ConfigError> {
    if value > 0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidOutputLength { value })
    }
}

/// Builds the vocabulary lookup graph.
///
/// The output is always `[1, output_vector_length]`: the looked-up ids are
/// right-padded with `output_vector_length` zeros and then sliced to the
/// first `output_vector_length` columns. Padding to the worst case avoids any
/// conditional operator, which portable runtimes do not all support.
///
/// # Example
///
/// ```
/// use numericalizer::builders::{Mapper, MapperConfig, Vocabulary};
/// use numericalizer::graph::Dim;
///
/// let vocabulary = Vocabulary::new([("cat", 2), ("dog", 3)]).unwrap();
/// let mapper = Mapper::new(MapperConfig::new(vocabulary).output_vector_length(5)).unwrap();
///
/// let graph = mapper.build().unwrap();
/// assert_eq!(graph.outputs()[0].shape(), [Dim::Fixed(1), Dim::Fixed(5)]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mapper {
    config: MapperConfig,
}

impl Mapper {
    /// Creates a mapper, validating the configuration.
    pub fn new(config: MapperConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &MapperConfig {
        &self.config
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.config.vocabulary
    }

    pub fn oov_token(&self) -> i64 {
        self.config.oov_token
    }

    pub fn output_vector_length(&self) -> i64 {
        self.config.output_vector_length
    }

    /// Replaces the vocabulary. The token and id projections travel with it.
    pub fn set_vocabulary(&mut self, vocabulary: Vocabulary) {
        self.config.vocabulary = vocabulary;
    }

    pub fn set_oov_token(&mut self, oov_token: i64) -> Result<(), ConfigError> {
        validate_oov_token(oov_token)?;
        self.config.oov_token = oov_token;
        Ok(())
    }

    pub fn set_output_vector_length(&mut self, length: i64) -> Result<(), ConfigError> {
        validate_output_length(length)?;
        self.config.output_vector_length = length;
        Ok(())
    }

    /// Emits the lookup, pad and slice graph.
    pub fn build(&self) -> Result<Graph, StructuralError> {
        let length = self.config.output_vector_length;
        let vocabulary = &self.config.vocabulary;

        let string_normalized = TensorDescriptor::new(
            INPUT_NAME,
            ElementType::String,
            vec![Dim::Fixed(1), Dim::Unbound],
        )?;
        let numeric_tensor = TensorDescriptor::new(
            OUTPUT_NAME,
            ElementType::Int64,
            vec![Dim::Fixed(1), Dim::Fixed(length)],
        )?;

        // [["cat", "dog", "fox"]] -> [[2, 3, oov]]
        let mapper_node = Node::new("CategoryMapper", [INPUT_NAME], ["numeric_output"])?
            .with_domain(ML_DOMAIN)
            .with_attr("cats_strings", vocabulary.tokens().to_vec())
            .with_attr("cats_int64s", vocabulary.ids().to_vec())
            .with_attr("default_int64", self.config.oov_token);

        // Pads are [x1_begin, x2_begin, x1_end, x2_end]: only the end of the
        // token axis grows.
        let pads_data = TensorConstant::int64_vector("pads_data", vec![0, 0, 0, length])?;
        let pads_node = Node::new("Constant", NO_INPUTS, ["pads"])?.with_attr("value", pads_data);

        // [[2, 3, oov]] -> [[2, 3, oov, 0, ..., 0]] (L + length columns)
        let padding_node = Node::new("Pad", ["numeric_output", "pads"], ["numeric_output_padded"])?
            .with_attr("mode", "constant");

        let slice_start_data = TensorConstant::int64_vector("slice_start_data", vec![0, 0])?;
        let slice_end_data = TensorConstant::int64_vector("slice_end_data", vec![1, length])?;
        let slice_start_node =
            Node::new("Constant", NO_INPUTS, ["slice_start"])?.with_attr("value", slice_start_data);
        let slice_end_node =
            Node::new("Constant", NO_INPUTS, ["slice_end"])?.with_attr("value", slice_end_data);

        // First `length` columns of the padded row.
        let slice_node = Node::new(
            "Slice",
            ["numeric_output_padded", "slice_start", "slice_end"],
            [OUTPUT_NAME],
        )?;

        let mut assembler = Graph::assembler("Mapper_graph");
        assembler.add_input(string_normalized)?;
        for node in [
            mapper_node,
            pads_node,
            padding_node,
            slice_start_node,
            slice_end_node,
            slice_node,
        ] {
            assembler.add_node(node)?;
        }
        assembler.add_output(numeric_tensor);
        assembler.finish()
    }

    /// Wraps [`build`](Self::build) in a model with the default opset imports.
    pub fn model(&self) -> Result<Model, StructuralError> {
        Model::new(self.build()?, default_opset_imports(), OnnxVersion::IR_VERSION)
    }
}

const NO_INPUTS: [&str; 0] = [];
