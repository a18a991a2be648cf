//! Result of a successful pattern match

use indexmap::IndexMap;

use crate::error::{GraphError, GraphResult};
use crate::graph::{NodeId, OutPort};

use super::boundary::{SubgraphBoundary, SubgraphInput, SubgraphOutput};

/// Binding of one pattern occurrence onto the target graph
///
/// An owned snapshot: it stays valid after the matcher that produced it is
/// dropped, and shares nothing with other results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchResult {
    /// Concrete pattern node → target node, in pattern construction order
    bindings: IndexMap<NodeId, NodeId>,
    inputs: Vec<SubgraphInput>,
    outputs: Vec<SubgraphOutput>,
    captures: Vec<OutPort>,
}

impl MatchResult {
    pub(crate) fn new(
        bindings: IndexMap<NodeId, NodeId>,
        inputs: Vec<SubgraphInput>,
        outputs: Vec<SubgraphOutput>,
        captures: Vec<OutPort>,
    ) -> Self {
        Self {
            bindings,
            inputs,
            outputs,
            captures,
        }
    }

    /// Target node bound to a concrete pattern node
    pub fn matched_node(&self, pattern_node: NodeId) -> GraphResult<NodeId> {
        self.bindings.get(&pattern_node).copied().ok_or_else(|| {
            GraphError::NotFound(format!(
                "pattern node {pattern_node} is not a concrete node of this match"
            ))
        })
    }

    /// All bound target nodes, in pattern construction order
    pub fn matched_nodes(&self) -> Vec<NodeId> {
        self.bindings.values().copied().collect()
    }

    /// `(pattern node, target node)` pairs in pattern construction order
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, NodeId)> + '_ {
        self.bindings.iter().map(|(p, t)| (*p, *t))
    }

    /// Check if a target node belongs to this match
    pub fn contains(&self, target: NodeId) -> bool {
        self.bindings.values().any(|t| *t == target)
    }

    /// Number of bound nodes
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Target port of the `index`-th capture registered on the pattern
    pub fn captured_tensor(&self, index: usize) -> GraphResult<OutPort> {
        self.captures
            .get(index)
            .copied()
            .ok_or(GraphError::CaptureOutOfRange {
                index,
                len: self.captures.len(),
            })
    }

    /// Number of resolved captures
    pub fn capture_count(&self) -> usize {
        self.captures.len()
    }

    /// Derive the region's external inputs and outputs
    ///
    /// Fails if a pattern input is read by no concrete node, or if the inputs
    /// reading one slot disagree on its producer.
    pub fn to_subgraph_boundary(&self) -> GraphResult<SubgraphBoundary> {
        for (slot, input) in self.inputs.iter().enumerate() {
            let Some(first) = input.producer() else {
                return Err(GraphError::InconsistentBoundary(format!(
                    "pattern input {slot} feeds no node"
                )));
            };
            if input.producers().iter().any(|p| *p != first) {
                return Err(GraphError::InconsistentBoundary(format!(
                    "pattern input {slot} is fed by different producers"
                )));
            }
        }

        Ok(SubgraphBoundary::new(
            self.inputs.clone(),
            self.outputs.clone(),
        ))
    }
}
