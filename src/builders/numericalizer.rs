//! Numericalizer: tokenizer and mapper spliced into one model.

use super::mapper::Mapper;
use super::tokenizer::Tokenizer;
use crate::errors::CompositionError;
use crate::graph::{Model, PortMap, merge_models};

/// Composes a [`Tokenizer`] and a [`Mapper`] into a single text-to-ids model.
///
/// The tokenizer's output feeds the mapper's input. By default the port map
/// pairs the tokenizer's first declared output with the mapper's first
/// declared input; [`with_port_map`](Self::with_port_map) overrides it.
///
/// # Example
///
/// ```
/// use numericalizer::builders::{Mapper, MapperConfig, Numericalizer, Tokenizer, Vocabulary};
///
/// let vocabulary = Vocabulary::new([("cat", 2), ("dog", 3)]).unwrap();
/// let mapper = Mapper::new(MapperConfig::new(vocabulary).output_vector_length(4)).unwrap();
/// let numericalizer = Numericalizer::new(Tokenizer::default(), mapper);
///
/// let model = numericalizer.build().unwrap();
/// assert_eq!(model.graph().nodes().len(), 8);
/// assert_eq!(model.graph().inputs()[0].name(), "string_input");
/// assert_eq!(model.graph().outputs()[0].name(), "numeric_tensor");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Numericalizer {
    tokenizer: Tokenizer,
    mapper: Mapper,
    port_map: Option<PortMap>,
}

impl Numericalizer {
    pub fn new(tokenizer: Tokenizer, mapper: Mapper) -> Self {
        Self {
            tokenizer,
            mapper,
            port_map: None,
        }
    }

    /// Uses an explicit port map instead of the derived one.
    pub fn with_port_map(mut self, port_map: PortMap) -> Self {
        self.port_map = Some(port_map);
        self
    }

    pub fn tokenizer(&self) -> &Tokenizer {
        &self.tokenizer
    }

    pub fn mapper(&self) -> &Mapper {
        &self.mapper
    }

    pub fn tokenizer_mut(&mut self) -> &mut Tokenizer {
        &mut self.tokenizer
    }

    pub fn mapper_mut(&mut self) -> &mut Mapper {
        &mut self.mapper
    }

    /// Builds both sub-models and splices them.
    pub fn build(&self) -> Result<Model, CompositionError> {
        let tokenizer = self.tokenizer.model()?;
        let mapper = self.mapper.model()?;

        let ports = match &self.port_map {
            Some(ports) => ports.clone(),
            None => derive_port_map(&tokenizer, &mapper)?,
        };
        merge_models(&tokenizer, &mapper, &ports, None)
    }
}

/// Pairs the producer's first output with the consumer's first input.
fn derive_port_map(producer: &Model, consumer: &Model) -> Result<PortMap, CompositionError> {
    let output = producer
        .graph()
        .outputs()
        .first()
        .ok_or_else(|| CompositionError::MissingOutputPort {
            graph: producer.graph().name().to_string(),
            name: String::new(),
        })?;
    let input = consumer
        .graph()
        .inputs()
        .first()
        .ok_or_else(|| CompositionError::MissingInputPort {
            graph: consumer.graph().name().to_string(),
            name: String::new(),
        })?;
    Ok(PortMap::single(output.name(), input.name()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builders::{MapperConfig, Vocabulary};

    fn numericalizer() -> Numericalizer {
        let vocabulary = Vocabulary::new([("cat", 2), ("dog", 3)]).unwrap();
        let mapper = Mapper::new(MapperConfig::new(vocabulary).output_vector_length(3)).unwrap();
        Numericalizer::new(Tokenizer::default(), mapper)
    }

    #[test]
    fn test_merged_structure() {
        let model = numericalizer().build().unwrap();
        let graph = model.graph();

        assert_eq!(graph.name(), "tokenizer_graph_Mapper_graph");
        assert_eq!(graph.inputs().len(), 1);
        assert_eq!(graph.outputs().len(), 1);
        assert_eq!(graph.nodes()[2].op_type(), "CategoryMapper");
        assert_eq!(graph.nodes()[2].inputs(), ["string_normalized".to_string()]);
        assert_eq!(model.opset_imports().len(), 3);
    }

    #[test]
    fn test_merged_nodes_partition_back() {
        let numericalizer = numericalizer();
        let tokenizer_graph = numericalizer.tokenizer().build().unwrap();
        let mapper_graph = numericalizer.mapper().build().unwrap();
        let merged = numericalizer.build().unwrap();

        let (head, tail) = merged
            .graph()
            .nodes()
            .split_at(tokenizer_graph.nodes().len());
        assert_eq!(head, tokenizer_graph.nodes());
        assert_eq!(tail, mapper_graph.nodes());
    }

    #[test]
    fn test_bad_port_map_fails() {
        let numericalizer =
            numericalizer().with_port_map(PortMap::single("string_normalized", "tokens"));
        assert!(matches!(
            numericalizer.build(),
            Err(CompositionError::MissingInputPort { name, .. }) if name == "tokens"
        ));
    }

    #[test]
    fn test_reconfigure_through_mut_accessors() {
        let mut numericalizer = numericalizer();
        numericalizer.mapper_mut().set_output_vector_length(7).unwrap();

        let model = numericalizer.build().unwrap();
        assert_eq!(
            model.graph().outputs()[0].shape(),
            [crate::graph::Dim::Fixed(1), crate::graph::Dim::Fixed(7)]
        );
    }

    #[test]
    fn test_build_is_idempotent() {
        let numericalizer = numericalizer();
        assert_eq!(numericalizer.build().unwrap(), numericalizer.build().unwrap());
    }
}
