//! Graph arena for dataflow models
//!
//! `Graph` is the central structure for working with dataflow graphs.
//! Nodes live in an arena addressed by [`NodeId`]; every node keeps the
//! producer of each input and the consumers of each output, so neighbour
//! lookups in either direction are O(1).

use crate::error::{GraphError, GraphResult, PortKind};
use crate::traits::GraphModel;

use super::attr::{AttrValue, Tensor};
use super::maps::NameMap;
use super::node::{InPort, Node, NodeId, OutPort};

/// Dataflow graph with ordered ports
///
/// Used both for target graphs and for the templates wrapped by
/// [`Pattern`](crate::pattern::Pattern).
#[derive(Debug, Clone, Default)]
pub struct Graph {
    /// Graph name, for diagnostics
    pub(crate) name: String,

    /// Node arena; removed nodes stay as tombstones so handles remain stable
    pub(crate) nodes: Vec<Node>,

    /// Maps node name → handle (live nodes only)
    pub(crate) names: NameMap,

    /// Graph input nodes, in declaration order
    pub(crate) inputs: Vec<NodeId>,

    /// Graph outputs, in declaration order
    pub(crate) outputs: Vec<OutPort>,
}

impl Graph {
    /// Create an empty graph
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Graph name
    pub fn name(&self) -> &str {
        &self.name
    }

    // ========================================================================
    // Node accessors
    // ========================================================================

    /// Get a live node by handle
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index()).filter(|n| !n.removed)
    }

    /// Get a node handle by name
    pub fn node_id(&self, name: &str) -> Option<NodeId> {
        self.names.get(name).copied()
    }

    /// Get a node by name
    pub fn get_node(&self, name: &str) -> Option<&Node> {
        self.node_id(name).and_then(|id| self.node(id))
    }

    /// Check if a node exists
    pub fn has_node(&self, name: &str) -> bool {
        self.names.contains_key(name)
    }

    /// Get the number of live nodes
    pub fn node_count(&self) -> usize {
        self.names.len()
    }

    /// Iterate over live node handles in creation order
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes().map(|(id, _)| id)
    }

    /// Iterate over live nodes in creation order
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| !n.removed)
            .map(|(i, n)| (NodeId::new(i), n))
    }

    /// Find nodes by op type, in creation order
    pub fn find_nodes_by_op(&self, op_type: &str) -> Vec<NodeId> {
        self.nodes()
            .filter(|(_, n)| n.op_type == op_type)
            .map(|(id, _)| id)
            .collect()
    }

    /// Arena length, including removed nodes
    pub(crate) fn slot_count(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) fn require(&self, id: NodeId) -> GraphResult<&Node> {
        self.node(id).ok_or(GraphError::InvalidNode(id))
    }

    // ========================================================================
    // Graph traversal
    // ========================================================================

    /// Get the producer feeding an input port
    pub fn producer(&self, input: InPort) -> Option<OutPort> {
        self.node(input.node).and_then(|n| n.producer(input.index))
    }

    /// Get the consumers of an output port
    pub fn consumers(&self, output: OutPort) -> &[InPort] {
        self.node(output.node)
            .map(|n| n.consumers(output.index))
            .unwrap_or(&[])
    }

    /// Graph input nodes in declaration order
    pub fn inputs(&self) -> &[NodeId] {
        &self.inputs
    }

    /// Graph outputs in declaration order
    pub fn outputs(&self) -> &[OutPort] {
        &self.outputs
    }

    /// Check if a node is a graph input
    pub fn is_graph_input(&self, id: NodeId) -> bool {
        self.inputs.contains(&id)
    }

    /// Check if an output port is a graph output
    pub fn is_graph_output(&self, port: OutPort) -> bool {
        self.outputs.contains(&port)
    }

    /// Check if a data edge connects `output` to `input`
    pub fn are_connected(&self, output: OutPort, input: InPort) -> bool {
        self.producer(input) == Some(output)
    }

    /// Whether any node carries a control edge
    pub fn has_control_edges(&self) -> bool {
        self.nodes().any(|(_, n)| n.has_control_edges())
    }

    pub(crate) fn check_output(&self, port: OutPort) -> GraphResult<&Node> {
        let node = self.require(port.node)?;
        if port.index >= node.output_count() {
            return Err(GraphError::PortOutOfRange {
                node: node.name.clone(),
                kind: PortKind::Output,
                index: port.index,
                arity: node.output_count(),
            });
        }
        Ok(node)
    }

    pub(crate) fn check_input(&self, port: InPort) -> GraphResult<&Node> {
        let node = self.require(port.node)?;
        if port.index >= node.input_count() {
            return Err(GraphError::PortOutOfRange {
                node: node.name.clone(),
                kind: PortKind::Input,
                index: port.index,
                arity: node.input_count(),
            });
        }
        Ok(node)
    }
}

impl GraphModel for Graph {
    fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        Graph::node_ids(self)
    }

    fn node_name(&self, node: NodeId) -> Option<&str> {
        self.node(node).map(Node::name)
    }

    fn op_type(&self, node: NodeId) -> Option<&str> {
        self.node(node).map(Node::op_type)
    }

    fn input_count(&self, node: NodeId) -> usize {
        self.node(node).map_or(0, Node::input_count)
    }

    fn output_count(&self, node: NodeId) -> usize {
        self.node(node).map_or(0, Node::output_count)
    }

    fn producer(&self, input: InPort) -> Option<OutPort> {
        Graph::producer(self, input)
    }

    fn consumers(&self, output: OutPort) -> &[InPort] {
        Graph::consumers(self, output)
    }

    fn is_graph_output(&self, output: OutPort) -> bool {
        Graph::is_graph_output(self, output)
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<&AttrValue> {
        self.node(node).and_then(|n| n.attribute(name))
    }

    fn const_value(&self, node: NodeId) -> Option<&Tensor> {
        self.node(node).and_then(Node::const_value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::NodeDef;

    fn make_test_graph() -> Graph {
        let mut graph = Graph::new("test");
        let x = graph.add_input("X").unwrap();
        let w = graph
            .add_const("W", Tensor::from_vec_f32(vec![0.5, 0.5]))
            .unwrap();
        let conv = graph
            .add_op(NodeDef::new("conv_0", "Conv").inputs(2), &[x.out(0), w.out(0)])
            .unwrap();
        let relu = graph
            .add_op(NodeDef::new("relu_0", "Relu"), &[conv.out(0)])
            .unwrap();
        graph.add_output(relu.out(0)).unwrap();
        graph
    }

    #[test]
    fn test_graph_creation() {
        let graph = make_test_graph();

        assert_eq!(graph.node_count(), 4);
        assert!(graph.has_node("conv_0"));
        assert!(graph.has_node("relu_0"));
        assert!(!graph.has_node("bn_0"));
    }

    #[test]
    fn test_get_node() {
        let graph = make_test_graph();

        let conv = graph.get_node("conv_0").unwrap();
        assert_eq!(conv.op_type(), "Conv");
        assert_eq!(conv.input_count(), 2);

        assert!(graph.get_node("nonexistent").is_none());
        assert!(graph.node(NodeId::new(42)).is_none());
    }

    #[test]
    fn test_producer_and_consumers() {
        let graph = make_test_graph();
        let x = graph.node_id("X").unwrap();
        let conv = graph.node_id("conv_0").unwrap();
        let relu = graph.node_id("relu_0").unwrap();

        assert_eq!(graph.producer(relu.input(0)), Some(conv.out(0)));
        assert_eq!(graph.producer(conv.input(0)), Some(x.out(0)));
        assert_eq!(graph.consumers(conv.out(0)), &[relu.input(0)]);
        assert!(graph.consumers(relu.out(0)).is_empty());
        assert!(graph.are_connected(conv.out(0), relu.input(0)));
    }

    #[test]
    fn test_graph_inputs_outputs() {
        let graph = make_test_graph();
        let x = graph.node_id("X").unwrap();
        let relu = graph.node_id("relu_0").unwrap();

        assert!(graph.is_graph_input(x));
        assert!(!graph.is_graph_input(relu));
        assert!(graph.is_graph_output(relu.out(0)));
        assert_eq!(graph.outputs(), &[relu.out(0)]);
    }

    #[test]
    fn test_node_iteration_order() {
        let graph = make_test_graph();

        let names: Vec<_> = graph.nodes().map(|(_, n)| n.name()).collect();
        assert_eq!(names, vec!["X", "W", "conv_0", "relu_0"]);
        assert_eq!(graph.find_nodes_by_op("Relu"), vec![NodeId::new(3)]);
    }

    #[test]
    fn test_graph_model_view() {
        let graph = make_test_graph();
        assert_eq!(GraphModel::op_type(&graph, NodeId::new(2)), Some("Conv"));
        assert_eq!(GraphModel::node_name(&graph, NodeId::new(0)), Some("X"));
        assert_eq!(
            GraphModel::const_value(&graph, NodeId::new(1)),
            Some(&Tensor::from_vec_f32(vec![0.5, 0.5]))
        );
        assert_eq!(GraphModel::input_count(&graph, NodeId::new(99)), 0);
    }
}
