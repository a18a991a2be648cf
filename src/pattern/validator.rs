//! Structural legality checks for pattern graphs
//!
//! A pattern must be matchable node by node: no control dependencies, no
//! nested graphs, and a statically known arity on every concrete node.

use thiserror::Error;

use crate::graph::Graph;

/// Reason a pattern graph can never be matched
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PatternDefect {
    /// Control dependencies inside the template are not matchable
    #[error("node {node} has control edge")]
    HasControlEdge {
        /// Offending node name
        node: String,
    },

    /// Nested control-flow regions are not matchable
    #[error("It has subgraph, node {node}")]
    HasSubgraph {
        /// Offending node name
        node: String,
    },

    /// Concrete node whose input count is only known at runtime
    #[error("node {node} is dynamic input")]
    DynamicInputNode {
        /// Offending node name
        node: String,
    },

    /// Concrete node whose output count is only known at runtime
    #[error("node {node} is dynamic output")]
    DynamicOutputNode {
        /// Offending node name
        node: String,
    },
}

/// Check a pattern graph, returning the first defect in node construction order
///
/// Graph inputs are wildcards and exempt from the arity checks.
pub fn validate_pattern(graph: &Graph) -> Result<(), PatternDefect> {
    for (id, node) in graph.nodes() {
        let name = || node.name().to_string();

        if node.has_control_edges() {
            return Err(PatternDefect::HasControlEdge { node: name() });
        }
        if node.has_subgraph() {
            return Err(PatternDefect::HasSubgraph { node: name() });
        }
        if graph.is_graph_input(id) {
            continue;
        }
        if node.is_dynamic_input() {
            return Err(PatternDefect::DynamicInputNode { node: name() });
        }
        if node.is_dynamic_output() {
            return Err(PatternDefect::DynamicOutputNode { node: name() });
        }
    }
    Ok(())
}
