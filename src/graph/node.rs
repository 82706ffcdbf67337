//! Operator invocations.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use super::attribute::AttributeValue;
use crate::errors::StructuralError;

/// A single operator invocation in a [`Graph`](super::Graph).
///
/// Attributes are kept in a sorted map, which is also the order they are
/// written out in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    op_type: String,
    #[serde(default)]
    domain: String,
    inputs: Vec<String>,
    outputs: Vec<String>,
    #[serde(default)]
    attributes: BTreeMap<String, AttributeValue>,
}

impl Node {
    /// Creates a node in the default domain.
    ///
    /// Empty input names stand for absent optional inputs. At least one output
    /// is required, and output names must be non-blank and distinct.
    pub fn new<I, O>(op_type: impl Into<String>, inputs: I, outputs: O) -> Result<Self, StructuralError>
    where
        I: IntoIterator,
        I::Item: Into<String>,
        O: IntoIterator,
        O::Item: Into<String>,
    {
        let node = Self {
            op_type: op_type.into(),
            domain: String::new(),
            inputs: inputs.into_iter().map(Into::into).collect(),
            outputs: outputs.into_iter().map(Into::into).collect(),
            attributes: BTreeMap::new(),
        };
        node.check()?;
        Ok(node)
    }

    /// Re-runs the construction checks, plus the length check of every
    /// embedded tensor constant.
    pub(crate) fn check(&self) -> Result<(), StructuralError> {
        if self.op_type.trim().is_empty() {
            return Err(StructuralError::BlankName { what: "Operator" });
        }
        if self.outputs.is_empty() {
            return Err(StructuralError::NoOutputs {
                op_type: self.op_type.clone(),
            });
        }

        let mut seen = HashSet::new();
        for output in &self.outputs {
            if output.trim().is_empty() {
                return Err(StructuralError::BlankName { what: "Node output" });
            }
            if !seen.insert(output.as_str()) {
                return Err(StructuralError::DuplicateTensor {
                    name: output.clone(),
                });
            }
        }

        for value in self.attributes.values() {
            if let AttributeValue::Tensor(tensor) = value {
                tensor.check()?;
            }
        }
        Ok(())
    }

    /// Sets the operator domain.
    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = domain.into();
        self
    }

    /// Adds (or replaces) an attribute.
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn op_type(&self) -> &str {
        &self.op_type
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn inputs(&self) -> &[String] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[String] {
        &self.outputs
    }

    pub fn attributes(&self) -> &BTreeMap<String, AttributeValue> {
        &self.attributes
    }

    pub fn attribute(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes.get(name)
    }

    /// Rewrites every input reference found in `renames`.
    pub(crate) fn rename_inputs(&mut self, renames: &BTreeMap<String, String>) {
        for input in &mut self.inputs {
            if let Some(target) = renames.get(input.as_str()) {
                *input = target.clone();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_creation() {
        let node = Node::new("Pad", ["numeric_output", "pads"], ["numeric_output_padded"])
            .unwrap()
            .with_attr("mode", "constant");

        assert_eq!(node.op_type(), "Pad");
        assert_eq!(node.domain(), "");
        assert_eq!(node.inputs().len(), 2);
        assert_eq!(node.attribute("mode").and_then(|a| a.as_str()), Some("constant"));
    }

    #[test]
    fn test_empty_input_is_allowed() {
        let node = Node::new("Slice", ["data", "", "ends"], ["out"]).unwrap();
        assert_eq!(node.inputs()[1], "");
    }

    #[test]
    fn test_blank_output_rejected() {
        let result = Node::new("Constant", Vec::<String>::new(), [""]);
        assert!(matches!(result, Err(StructuralError::BlankName { .. })));
    }

    #[test]
    fn test_duplicate_output_rejected() {
        let result = Node::new("Split", ["x"], ["y", "y"]);
        assert!(matches!(
            result,
            Err(StructuralError::DuplicateTensor { name }) if name == "y"
        ));
    }

    #[test]
    fn test_node_without_outputs_rejected() {
        let result = Node::new("StringNormalizer", ["x"], Vec::<String>::new());
        assert!(matches!(
            result,
            Err(StructuralError::NoOutputs { op_type }) if op_type == "StringNormalizer"
        ));
    }

    #[test]
    fn test_blank_op_type_rejected() {
        assert!(Node::new("", ["x"], ["y"]).is_err());
    }

    #[test]
    fn test_rename_inputs() {
        let mut node = Node::new("CategoryMapper", ["tokens"], ["ids"]).unwrap();
        let renames = BTreeMap::from([("tokens".to_string(), "string_normalized".to_string())]);
        node.rename_inputs(&renames);
        assert_eq!(node.inputs(), ["string_normalized".to_string()]);
    }
}
