//! Graph - ordered node list plus declared inputs and outputs.
//!
//! Graphs are assembled through [`GraphAssembler`], which checks the naming
//! and ordering invariants as nodes are added, so a finished [`Graph`] is
//! always topologically ordered with unique tensor names.

use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};

use super::node::Node;
use super::tensor::TensorDescriptor;
use crate::errors::StructuralError;

/// An immutable computation graph.
///
/// # Example
///
/// ```
/// use numericalizer::graph::{Dim, ElementType, Graph, Node, TensorDescriptor};
///
/// let mut assembler = Graph::assembler("identity_graph");
/// assembler
///     .add_input(TensorDescriptor::new("x", ElementType::Int64, vec![Dim::Fixed(1)]).unwrap())
///     .unwrap();
/// assembler.add_node(Node::new("Identity", ["x"], ["y"]).unwrap()).unwrap();
/// assembler.add_output(TensorDescriptor::new("y", ElementType::Int64, vec![Dim::Fixed(1)]).unwrap());
/// let graph = assembler.finish().unwrap();
///
/// assert_eq!(graph.nodes().len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Graph {
    name: String,
    nodes: Vec<Node>,
    inputs: Vec<TensorDescriptor>,
    outputs: Vec<TensorDescriptor>,
}

impl Graph {
    /// Starts assembling a graph with the given name.
    pub fn assembler(name: impl Into<String>) -> GraphAssembler {
        GraphAssembler::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn inputs(&self) -> &[TensorDescriptor] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[TensorDescriptor] {
        &self.outputs
    }

    /// Looks up a declared input by name.
    pub fn input(&self, name: &str) -> Option<&TensorDescriptor> {
        self.inputs.iter().find(|t| t.name() == name)
    }

    /// Looks up a declared output by name.
    pub fn output(&self, name: &str) -> Option<&TensorDescriptor> {
        self.outputs.iter().find(|t| t.name() == name)
    }

    /// Distinct operator domains referenced by the nodes.
    pub fn domains(&self) -> BTreeSet<&str> {
        self.nodes.iter().map(|n| n.domain()).collect()
    }

    /// Re-checks every structural invariant.
    ///
    /// Graphs built through [`GraphAssembler`] always pass; this is for graphs
    /// that arrive through deserialization, which bypasses the constructors of
    /// nodes, descriptors and constants. The assembler re-checks all three.
    pub fn validate(&self) -> Result<(), StructuralError> {
        let mut assembler = GraphAssembler::new(self.name.clone());
        for input in &self.inputs {
            assembler.add_input(input.clone())?;
        }
        for node in &self.nodes {
            assembler.add_node(node.clone())?;
        }
        for output in &self.outputs {
            assembler.add_output(output.clone());
        }
        assembler.finish().map(|_| ())
    }
}

/// Incremental, checked construction of a [`Graph`].
#[derive(Debug)]
pub struct GraphAssembler {
    name: String,
    nodes: Vec<Node>,
    inputs: Vec<TensorDescriptor>,
    outputs: Vec<TensorDescriptor>,
    /// Every tensor name defined so far (graph inputs and node outputs).
    defined: HashSet<String>,
}

impl GraphAssembler {
    /// Creates an empty assembler.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nodes: Vec::new(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            defined: HashSet::new(),
        }
    }

    /// Declares a graph input.
    pub fn add_input(&mut self, input: TensorDescriptor) -> Result<&mut Self, StructuralError> {
        input.check()?;
        self.define(input.name())?;
        self.inputs.push(input);
        Ok(self)
    }

    /// Appends a node. Every non-empty input must already be defined, and
    /// every output must be a fresh name.
    pub fn add_node(&mut self, node: Node) -> Result<&mut Self, StructuralError> {
        node.check()?;
        for input in node.inputs() {
            if !input.is_empty() && !self.defined.contains(input) {
                return Err(StructuralError::DanglingInput {
                    op_type: node.op_type().to_string(),
                    name: input.clone(),
                });
            }
        }
        for output in node.outputs() {
            self.define(output)?;
        }
        self.nodes.push(node);
        Ok(self)
    }

    /// Declares a graph output. Checked against the defined names in
    /// [`finish`](Self::finish), so outputs may be declared up front.
    pub fn add_output(&mut self, output: TensorDescriptor) -> &mut Self {
        self.outputs.push(output);
        self
    }

    /// Returns whether a tensor name is already defined.
    pub fn is_defined(&self, name: &str) -> bool {
        self.defined.contains(name)
    }

    /// Finalizes the graph.
    pub fn finish(self) -> Result<Graph, StructuralError> {
        if self.name.trim().is_empty() {
            return Err(StructuralError::BlankName { what: "Graph" });
        }

        let mut declared = HashSet::new();
        for output in &self.outputs {
            output.check()?;
            if !declared.insert(output.name()) {
                return Err(StructuralError::DuplicateTensor {
                    name: output.name().to_string(),
                });
            }
            if !self.defined.contains(output.name()) {
                return Err(StructuralError::UnproducedOutput {
                    name: output.name().to_string(),
                });
            }
        }

        log::debug!(
            "assembled graph {} ({} nodes, {} inputs, {} outputs)",
            self.name,
            self.nodes.len(),
            self.inputs.len(),
            self.outputs.len()
        );

        Ok(Graph {
            name: self.name,
            nodes: self.nodes,
            inputs: self.inputs,
            outputs: self.outputs,
        })
    }

    fn define(&mut self, name: &str) -> Result<(), StructuralError> {
        if !self.defined.insert(name.to_string()) {
            return Err(StructuralError::DuplicateTensor {
                name: name.to_string(),
            });
        }
        Ok(())
    }
}
