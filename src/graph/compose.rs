//! Splicing two independently built graphs into one.
//!
//! Composition is name based: a [`PortMap`] lists which producer outputs feed
//! which consumer inputs. Consumer references to a mapped input are renamed to
//! the producer's output; no node is inserted at the boundary.

use std::collections::{BTreeMap, HashSet};

use super::core::Graph;
use super::model::{Model, OpsetId};
use crate::errors::CompositionError;

/// Ordered list of `(producer_output, consumer_input)` connections.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PortMap {
    pairs: Vec<(String, String)>,
}

impl PortMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// A map with a single connection.
    pub fn single(producer_output: impl Into<String>, consumer_input: impl Into<String>) -> Self {
        Self::new().connect(producer_output, consumer_input)
    }

    /// Adds a connection.
    pub fn connect(
        mut self,
        producer_output: impl Into<String>,
        consumer_input: impl Into<String>,
    ) -> Self {
        self.pairs
            .push((producer_output.into(), consumer_input.into()));
        self
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// Merges `consumer` after `producer`.
///
/// The merged node list is the producer's nodes followed by the consumer's, in
/// order. Inputs are the producer's inputs followed by the consumer's unmapped
/// inputs; outputs are the producer's unmapped outputs followed by the
/// consumer's outputs. `name` defaults to `<producer>_<consumer>`.
pub fn merge_graphs(
    producer: &Graph,
    consumer: &Graph,
    ports: &PortMap,
    name: Option<&str>,
) -> Result<Graph, CompositionError> {
    let renames = resolve_ports(producer, consumer, ports)?;
    let consumed: HashSet<&str> = ports.pairs().iter().map(|(p, _)| p.as_str()).collect();

    // Names the producer already owns; the consumer must not redefine any.
    let mut taken: HashSet<&str> = producer.inputs().iter().map(|t| t.name()).collect();
    taken.extend(
        producer
            .nodes()
            .iter()
            .flat_map(|n| n.outputs())
            .map(String::as_str),
    );
    let consumer_defined = consumer
        .inputs()
        .iter()
        .map(|t| t.name())
        .filter(|name| !renames.contains_key(*name))
        .chain(
            consumer
                .nodes()
                .iter()
                .flat_map(|n| n.outputs())
                .map(String::as_str),
        );
    for defined in consumer_defined {
        if taken.contains(defined) {
            return Err(CompositionError::NameCollision {
                name: defined.to_string(),
            });
        }
    }

    let name = name
        .map(str::to_string)
        .unwrap_or_else(|| format!("{}_{}", producer.name(), consumer.name()));
    let mut assembler = Graph::assembler(name);

    for input in producer.inputs() {
        assembler.add_input(input.clone())?;
    }
    for input in consumer.inputs() {
        if !renames.contains_key(input.name()) {
            assembler.add_input(input.clone())?;
        }
    }

    for node in producer.nodes() {
        assembler.add_node(node.clone())?;
    }
    for node in consumer.nodes() {
        let mut node = node.clone();
        node.rename_inputs(&renames);
        assembler.add_node(node)?;
    }

    let mut declared = HashSet::new();
    let outputs = producer
        .outputs()
        .iter()
        .filter(|o| !consumed.contains(o.name()))
        .cloned()
        .chain(consumer.outputs().iter().map(|o| match renames.get(o.name()) {
            Some(target) => o.renamed(target),
            None => o.clone(),
        }));
    for output in outputs {
        if !declared.insert(output.name().to_string()) {
            return Err(CompositionError::NameCollision {
                name: output.name().to_string(),
            });
        }
        assembler.add_output(output);
    }

    Ok(assembler.finish()?)
}

/// Merges two models: the graphs via [`merge_graphs`], the opset imports via
/// [`merge_opsets`]. Both models must share an IR version.
pub fn merge_models(
    producer: &Model,
    consumer: &Model,
    ports: &PortMap,
    name: Option<&str>,
) -> Result<Model, CompositionError> {
    if producer.ir_version() != consumer.ir_version() {
        return Err(CompositionError::IrVersionMismatch {
            left: producer.ir_version(),
            right: consumer.ir_version(),
        });
    }

    let opset_imports = merge_opsets(producer.opset_imports(), consumer.opset_imports())?;
    let graph = merge_graphs(producer.graph(), consumer.graph(), ports, name)?;
    let model = Model::new(graph, opset_imports, producer.ir_version())?;

    log::info!(
        "composed model {} ({} nodes, {} opset imports)",
        model.graph().name(),
        model.graph().nodes().len(),
        model.opset_imports().len()
    );
    Ok(model)
}

/// Union of two opset import lists, keeping first-seen order.
///
/// A domain present in both lists must have the same version in each.
pub fn merge_opsets(left: &[OpsetId], right: &[OpsetId]) -> Result<Vec<OpsetId>, CompositionError> {
    let mut merged: Vec<OpsetId> = left.to_vec();
    for opset in right {
        match merged.iter().find(|o| o.domain == opset.domain) {
            Some(existing) if existing.version != opset.version => {
                return Err(CompositionError::OpsetConflict {
                    domain: opset.domain.clone(),
                    left: existing.version,
                    right: opset.version,
                });
            }
            Some(_) => {}
            None => merged.push(opset.clone()),
        }
    }
    Ok(merged)
}

/// Validates the port map against both graphs and returns the consumer-side
/// rename table.
fn resolve_ports(
    producer: &Graph,
    consumer: &Graph,
    ports: &PortMap,
) -> Result<BTreeMap<String, String>, CompositionError> {
    if ports.is_empty() {
        return Err(CompositionError::EmptyPortMap);
    }

    let mut renames = BTreeMap::new();
    for (out_name, in_name) in ports.pairs() {
        let source = producer
            .output(out_name)
            .ok_or_else(|| CompositionError::MissingOutputPort {
                graph: producer.name().to_string(),
                name: out_name.clone(),
            })?;
        let target = consumer
            .input(in_name)
            .ok_or_else(|| CompositionError::MissingInputPort {
                graph: consumer.name().to_string(),
                name: in_name.clone(),
            })?;

        if !source.is_compatible_with(target) {
            return Err(CompositionError::IncompatiblePort {
                producer: out_name.clone(),
                consumer: in_name.clone(),
                producer_type: source.element_type(),
                producer_shape: source.shape().to_vec(),
                consumer_type: target.element_type(),
                consumer_shape: target.shape().to_vec(),
            });
        }

        if renames.insert(in_name.clone(), out_name.clone()).is_some() {
            return Err(CompositionError::DuplicatePort {
                name: in_name.clone(),
            });
        }
        log::debug!("splicing {} -> {}", out_name, in_name);
    }
    Ok(renames)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Dim, ElementType, Node, TensorDescriptor};

    fn strings(name: &str) -> TensorDescriptor {
        TensorDescriptor::new(name, ElementType::String, vec![Dim::Fixed(1), Dim::Unbound]).unwrap()
    }

    fn ints(name: &str) -> TensorDescriptor {
        TensorDescriptor::new(name, ElementType::Int64, vec![Dim::Fixed(1), Dim::Unbound]).unwrap()
    }

    fn chain(name: &str, input: TensorDescriptor, op: &str, output: TensorDescriptor) -> Graph {
        let mut assembler = Graph::assembler(name);
        let node = Node::new(op, [input.name()], [output.name()]).unwrap();
        assembler.add_input(input).unwrap();
        assembler.add_node(node).unwrap();
        assembler.add_output(output);
        assembler.finish().unwrap()
    }

    #[test]
    fn test_merge_renames_consumer_input() {
        let producer = chain("a", strings("text"), "StringNormalizer", strings("clean"));
        let consumer = chain("b", strings("tokens"), "CategoryMapper", ints("ids"));

        let merged =
            merge_graphs(&producer, &consumer, &PortMap::single("clean", "tokens"), None).unwrap();

        assert_eq!(merged.name(), "a_b");
        assert_eq!(merged.nodes().len(), 2);
        assert_eq!(merged.nodes()[1].inputs(), ["clean".to_string()]);
        assert_eq!(merged.inputs().len(), 1);
        assert_eq!(merged.inputs()[0].name(), "text");
        assert_eq!(merged.outputs().len(), 1);
        assert_eq!(merged.outputs()[0].name(), "ids");
    }

    #[test]
    fn test_missing_input_port() {
        let producer = chain("a", strings("text"), "StringNormalizer", strings("clean"));
        let consumer = chain("b", strings("tokens"), "CategoryMapper", ints("ids"));

        let result = merge_graphs(&producer, &consumer, &PortMap::single("clean", "nope"), None);
        assert!(matches!(
            result,
            Err(CompositionError::MissingInputPort { name, .. }) if name == "nope"
        ));
    }

    #[test]
    fn test_missing_output_port() {
        let producer = chain("a", strings("text"), "StringNormalizer", strings("clean"));
        let consumer = chain("b", strings("tokens"), "CategoryMapper", ints("ids"));

        let result = merge_graphs(&producer, &consumer, &PortMap::single("text", "tokens"), None);
        assert!(matches!(
            result,
            Err(CompositionError::MissingOutputPort { name, .. }) if name == "text"
        ));
    }

    #[test]
    fn test_empty_port_map_rejected() {
        let producer = chain("a", strings("text"), "StringNormalizer", strings("clean"));
        let consumer = chain("b", strings("tokens"), "CategoryMapper", ints("ids"));
        assert_eq!(
            merge_graphs(&producer, &consumer, &PortMap::new(), None),
            Err(CompositionError::EmptyPortMap)
        );
    }

    #[test]
    fn test_incompatible_port_rejected() {
        let producer = chain("a", strings("text"), "CategoryMapper", ints("ids"));
        let consumer = chain("b", strings("tokens"), "StringNormalizer", strings("clean"));

        let result = merge_graphs(&producer, &consumer, &PortMap::single("ids", "tokens"), None);
        assert!(matches!(result, Err(CompositionError::IncompatiblePort { .. })));
    }

    #[test]
    fn test_name_collision_rejected() {
        let producer = chain("a", strings("text"), "StringNormalizer", strings("clean"));
        // Consumer produces a tensor the producer already defines.
        let consumer = chain("b", strings("tokens"), "StringNormalizer", strings("text"));

        let result = merge_graphs(&producer, &consumer, &PortMap::single("clean", "tokens"), None);
        assert!(matches!(
            result,
            Err(CompositionError::NameCollision { name }) if name == "text"
        ));
    }

    #[test]
    fn test_duplicate_consumer_port_rejected() {
        let producer = chain("a", strings("text"), "StringNormalizer", strings("clean"));
        let consumer = chain("b", strings("tokens"), "CategoryMapper", ints("ids"));
        let ports = PortMap::single("clean", "tokens").connect("clean", "tokens");

        let result = merge_graphs(&producer, &consumer, &ports, None);
        assert!(matches!(result, Err(CompositionError::DuplicatePort { .. })));
    }

    #[test]
    fn test_merge_opsets_union() {
        let left = vec![OpsetId::new("", 17), OpsetId::new("com.microsoft", 1)];
        let right = vec![OpsetId::new("", 17), OpsetId::new("ai.onnx.ml", 1)];

        let merged = merge_opsets(&left, &right).unwrap();
        assert_eq!(
            merged,
            vec![
                OpsetId::new("", 17),
                OpsetId::new("com.microsoft", 1),
                OpsetId::new("ai.onnx.ml", 1),
            ]
        );
    }

    #[test]
    fn test_merge_opsets_conflict() {
        let left = vec![OpsetId::new("", 17)];
        let right = vec![OpsetId::new("", 18)];

        assert_eq!(
            merge_opsets(&left, &right),
            Err(CompositionError::OpsetConflict {
                domain: String::new(),
                left: 17,
                right: 18,
            })
        );
    }

    #[test]
    fn test_merge_models_ir_mismatch() {
        let producer = chain("a", strings("text"), "StringNormalizer", strings("clean"));
        let consumer = chain("b", strings("tokens"), "StringNormalizer", strings("out"));
        let left = Model::new(producer, vec![OpsetId::new("", 17)], 8).unwrap();
        let right = Model::new(consumer, vec![OpsetId::new("", 17)], 9).unwrap();

        let result = merge_models(&left, &right, &PortMap::single("clean", "tokens"), None);
        assert_eq!(
            result,
            Err(CompositionError::IrVersionMismatch { left: 8, right: 9 })
        );
    }
}
