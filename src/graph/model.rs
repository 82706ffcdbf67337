//! Model - a graph plus the opset and IR versions it is exported with.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::core::Graph;
use crate::constants::{DEFAULT_DOMAIN, OnnxVersion, default_opset_imports};
use crate::errors::{Error, StructuralError};

/// An operator-set requirement: `domain` at `version`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OpsetId {
    pub domain: String,
    pub version: i64,
}

impl OpsetId {
    pub fn new(domain: impl Into<String>, version: i64) -> Self {
        Self {
            domain: domain.into(),
            version,
        }
    }
}

/// The exportable unit: a validated graph with its opset imports.
///
/// Every domain referenced by a node, plus the default domain, has exactly one
/// opset import.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Model {
    graph: Graph,
    opset_imports: Vec<OpsetId>,
    ir_version: i64,
}

impl Model {
    /// Wraps a graph, checking that every node domain has an opset import.
    pub fn new(
        graph: Graph,
        opset_imports: Vec<OpsetId>,
        ir_version: i64,
    ) -> Result<Self, StructuralError> {
        check_opsets(&graph, &opset_imports)?;
        Ok(Self {
            graph,
            opset_imports,
            ir_version,
        })
    }

    /// Wraps a graph with the crate-wide opset imports and IR version.
    pub fn with_default_opsets(graph: Graph) -> Result<Self, StructuralError> {
        Self::new(graph, default_opset_imports(), OnnxVersion::IR_VERSION)
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn into_graph(self) -> Graph {
        self.graph
    }

    pub fn opset_imports(&self) -> &[OpsetId] {
        &self.opset_imports
    }

    pub fn ir_version(&self) -> i64 {
        self.ir_version
    }

    /// Returns the imported version of `domain`, if any.
    pub fn opset_version(&self, domain: &str) -> Option<i64> {
        self.opset_imports
            .iter()
            .find(|o| o.domain == domain)
            .map(|o| o.version)
    }

    /// Exports the model as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Loads a model from JSON, re-running every structural check.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        let model: Model = serde_json::from_str(json)?;
        model.graph.validate()?;
        check_opsets(&model.graph, &model.opset_imports)?;
        Ok(model)
    }
}

fn check_opsets(graph: &Graph, opset_imports: &[OpsetId]) -> Result<(), StructuralError> {
    let mut seen = HashSet::new();
    for opset in opset_imports {
        if !seen.insert(opset.domain.as_str()) {
            return Err(StructuralError::DuplicateOpset {
                domain: opset.domain.clone(),
            });
        }
    }

    let required = graph
        .domains()
        .into_iter()
        .chain(std::iter::once(DEFAULT_DOMAIN));
    for domain in required {
        if !seen.contains(domain) {
            return Err(StructuralError::MissingOpset {
                domain: domain.to_string(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Dim, ElementType, Node, TensorDescriptor};

    fn category_graph() -> Graph {
        let mut assembler = Graph::assembler("g");
        assembler
            .add_input(
                TensorDescriptor::new("tokens", ElementType::String, vec![Dim::Fixed(1), Dim::Unbound])
                    .unwrap(),
            )
            .unwrap();
        assembler
            .add_node(
                Node::new("CategoryMapper", ["tokens"], ["ids"])
                    .unwrap()
                    .with_domain("ai.onnx.ml"),
            )
            .unwrap();
        assembler.add_output(
            TensorDescriptor::new("ids", ElementType::Int64, vec![Dim::Fixed(1), Dim::Unbound])
                .unwrap(),
        );
        assembler.finish().unwrap()
    }

    #[test]
    fn test_default_opsets() {
        let model = Model::with_default_opsets(category_graph()).unwrap();
        assert_eq!(model.ir_version(), 8);
        assert_eq!(model.opset_version(""), Some(17));
        assert_eq!(model.opset_version("ai.onnx.ml"), Some(1));
        assert_eq!(model.opset_version("com.microsoft"), Some(1));
    }

    #[test]
    fn test_missing_node_domain_rejected() {
        let result = Model::new(category_graph(), vec![OpsetId::new("", 17)], 8);
        assert!(matches!(
            result,
            Err(StructuralError::MissingOpset { domain }) if domain == "ai.onnx.ml"
        ));
    }

    #[test]
    fn test_default_domain_always_required() {
        let result = Model::new(category_graph(), vec![OpsetId::new("ai.onnx.ml", 1)], 8);
        assert!(matches!(
            result,
            Err(StructuralError::MissingOpset { domain }) if domain.is_empty()
        ));
    }

    #[test]
    fn test_duplicate_opset_rejected() {
        let result = Model::new(
            category_graph(),
            vec![
                OpsetId::new("", 17),
                OpsetId::new("ai.onnx.ml", 1),
                OpsetId::new("", 18),
            ],
            8,
        );
        assert!(matches!(result, Err(StructuralError::DuplicateOpset { .. })));
    }

    #[test]
    fn test_json_round_trip() {
        let model = Model::with_default_opsets(category_graph()).unwrap();
        let json = model.to_json().unwrap();
        assert!(json.contains("CategoryMapper"));

        let loaded = Model::from_json(&json).unwrap();
        assert_eq!(loaded, model);
    }

    #[test]
    fn test_from_json_rejects_dangling_reference() {
        let model = Model::with_default_opsets(category_graph()).unwrap();
        let mut value = serde_json::to_value(&model).unwrap();
        value["graph"]["nodes"][0]["inputs"][0] = serde_json::json!("missing");
        let json = serde_json::to_string(&value).unwrap();

        assert!(matches!(
            Model::from_json(&json),
            Err(Error::Structural(StructuralError::DanglingInput { .. }))
        ));
    }

    fn edited_json(edit: impl FnOnce(&mut serde_json::Value)) -> String {
        let model = Model::with_default_opsets(category_graph()).unwrap();
        let mut value = serde_json::to_value(&model).unwrap();
        edit(&mut value);
        serde_json::to_string(&value).unwrap()
    }

    #[test]
    fn test_from_json_rejects_blank_op_type() {
        let json = edited_json(|v| v["graph"]["nodes"][0]["op_type"] = serde_json::json!("  "));
        assert!(matches!(
            Model::from_json(&json),
            Err(Error::Structural(StructuralError::BlankName { what: "Operator" }))
        ));
    }

    #[test]
    fn test_from_json_rejects_node_without_outputs() {
        let json = edited_json(|v| v["graph"]["nodes"][0]["outputs"] = serde_json::json!([]));
        assert!(matches!(
            Model::from_json(&json),
            Err(Error::Structural(StructuralError::NoOutputs { .. }))
        ));
    }

    #[test]
    fn test_from_json_rejects_blank_input_name() {
        let json = edited_json(|v| v["graph"]["inputs"][0]["name"] = serde_json::json!(""));
        assert!(matches!(
            Model::from_json(&json),
            Err(Error::Structural(StructuralError::BlankName { what: "Tensor" }))
        ));
    }

    #[test]
    fn test_from_json_rejects_short_constant() {
        let mapper = crate::builders::Mapper::new(crate::builders::MapperConfig::new(
            crate::builders::Vocabulary::new([("cat", 2)]).unwrap(),
        ))
        .unwrap();
        let mut value = serde_json::to_value(mapper.model().unwrap()).unwrap();
        let pads = &mut value["graph"]["nodes"][1];
        assert_eq!(pads["outputs"][0], "pads");
        pads["attributes"]["value"]["value"]["data"]["values"] = serde_json::json!([0]);
        let json = serde_json::to_string(&value).unwrap();

        assert!(matches!(
            Model::from_json(&json),
            Err(Error::Structural(StructuralError::ConstantLength {
                expected: 4,
                actual: 1,
                ..
            }))
        ));
    }
}
