//! Core traits for fusion-matcher
//!
//! Defines the read-only graph interface the matcher searches over.

use crate::graph::{AttrValue, InPort, NodeId, OutPort, Tensor};

/// Read-only view of a target graph
///
/// This is everything [`PatternMatcher`](crate::pattern::PatternMatcher) needs
/// from a graph provider. [`Graph`](crate::graph::Graph) implements it; other
/// IRs can be searched by implementing it over their own storage.
///
/// Node handles must stay stable for the lifetime of the view, and
/// [`node_ids`](GraphModel::node_ids) must yield nodes in a fixed order
/// (creation order for `Graph`) so that match enumeration is reproducible.
///
/// # Example
///
/// ```ignore
/// struct Frozen { /* ... */ }
///
/// impl GraphModel for Frozen {
///     fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
///         (0..self.len()).map(NodeId::new)
///     }
///     // ...
/// }
/// ```
pub trait GraphModel {
    /// Live nodes in a stable order
    fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_;

    /// Node name, for diagnostics
    fn node_name(&self, node: NodeId) -> Option<&str>;

    /// Operation type tag
    fn op_type(&self, node: NodeId) -> Option<&str>;

    /// Number of input slots
    fn input_count(&self, node: NodeId) -> usize;

    /// Number of output slots
    fn output_count(&self, node: NodeId) -> usize;

    /// Producer feeding an input slot
    fn producer(&self, input: InPort) -> Option<OutPort>;

    /// Consumers of an output slot, in a stable order
    fn consumers(&self, output: OutPort) -> &[InPort];

    /// Whether the output is exported from the graph
    fn is_graph_output(&self, output: OutPort) -> bool;

    /// Attribute lookup by name
    fn attribute(&self, node: NodeId, name: &str) -> Option<&AttrValue>;

    /// Materialized value of a constant node
    fn const_value(&self, node: NodeId) -> Option<&Tensor>;
}
