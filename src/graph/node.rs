//! Node handles, port references and node descriptions

use std::fmt;

use smallvec::SmallVec;

use super::attr::{AttrValue, Tensor};
use super::maps::{AttrMap, ConsumerList};

/// Stable handle of a node inside its graph
///
/// Handles are arena indexes: they are assigned in creation order and are never
/// reused, even after the node is removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    /// Largest arena index a handle can hold
    pub const MAX_INDEX: usize = u32::MAX as usize;

    /// Create a handle from an arena index
    ///
    /// # Panics
    /// If `index` exceeds [`NodeId::MAX_INDEX`].
    pub fn new(index: usize) -> Self {
        match Self::try_new(index) {
            Some(id) => id,
            None => panic!("node index {index} exceeds the u32 handle range"),
        }
    }

    /// Create a handle, or `None` if `index` exceeds [`NodeId::MAX_INDEX`]
    pub fn try_new(index: usize) -> Option<Self> {
        u32::try_from(index).ok().map(Self)
    }

    /// Arena index of this node
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Reference to output slot `index` of this node
    #[inline]
    pub fn out(self, index: usize) -> OutPort {
        OutPort::new(self, index)
    }

    /// Reference to input slot `index` of this node
    #[inline]
    pub fn input(self, index: usize) -> InPort {
        InPort::new(self, index)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%{}", self.0)
    }
}

/// One output slot of a node: the producer side of a data edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OutPort {
    /// Owning node
    pub node: NodeId,
    /// Output index
    pub index: usize,
}

impl OutPort {
    /// Create an output port reference
    pub fn new(node: NodeId, index: usize) -> Self {
        Self { node, index }
    }
}

impl fmt::Display for OutPort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:out{}", self.node, self.index)
    }
}

/// One input slot of a node: the consumer side of a data edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InPort {
    /// Owning node
    pub node: NodeId,
    /// Input index
    pub index: usize,
}

impl InPort {
    /// Create an input port reference
    pub fn new(node: NodeId, index: usize) -> Self {
        Self { node, index }
    }
}

impl fmt::Display for InPort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:in{}", self.node, self.index)
    }
}

/// A node stored in a [`Graph`](super::Graph)
///
/// Nodes are created from a [`NodeDef`] and only change through the graph's
/// mutators.
#[derive(Debug, Clone)]
pub struct Node {
    pub(crate) name: String,
    pub(crate) op_type: String,
    pub(crate) inputs: SmallVec<[Option<OutPort>; 4]>,
    pub(crate) outputs: SmallVec<[ConsumerList; 2]>,
    pub(crate) attrs: AttrMap,
    pub(crate) const_value: Option<Tensor>,
    pub(crate) dynamic_inputs: bool,
    pub(crate) dynamic_outputs: bool,
    pub(crate) control_inputs: SmallVec<[NodeId; 2]>,
    pub(crate) control_outputs: SmallVec<[NodeId; 2]>,
    pub(crate) removed: bool,
}

impl Node {
    pub(crate) fn from_def(def: NodeDef) -> Self {
        Self {
            name: def.name,
            op_type: def.op_type,
            inputs: SmallVec::from_elem(None, def.inputs),
            outputs: (0..def.outputs).map(|_| ConsumerList::new()).collect(),
            attrs: def.attrs,
            const_value: def.const_value,
            dynamic_inputs: def.dynamic_inputs,
            dynamic_outputs: def.dynamic_outputs,
            control_inputs: SmallVec::new(),
            control_outputs: SmallVec::new(),
            removed: false,
        }
    }

    /// Unique node name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Operation type tag
    pub fn op_type(&self) -> &str {
        &self.op_type
    }

    /// Number of input slots
    pub fn input_count(&self) -> usize {
        self.inputs.len()
    }

    /// Number of output slots
    pub fn output_count(&self) -> usize {
        self.outputs.len()
    }

    /// Producer feeding each input slot, in port order
    pub fn inputs(&self) -> &[Option<OutPort>] {
        &self.inputs
    }

    /// Producer feeding input `index`
    pub fn producer(&self, index: usize) -> Option<OutPort> {
        self.inputs.get(index).copied().flatten()
    }

    /// Consumers of output `index`, in connection order
    pub fn consumers(&self, index: usize) -> &[InPort] {
        self.outputs.get(index).map(|c| c.as_slice()).unwrap_or(&[])
    }

    /// Consumer lists of all outputs, in port order
    pub fn consumer_lists(&self) -> impl Iterator<Item = &[InPort]> {
        self.outputs.iter().map(|c| c.as_slice())
    }

    /// Named attributes in insertion order
    pub fn attributes(&self) -> &AttrMap {
        &self.attrs
    }

    /// Attribute by name
    pub fn attribute(&self, name: &str) -> Option<&AttrValue> {
        self.attrs.get(name)
    }

    /// Materialized value of a constant node
    pub fn const_value(&self) -> Option<&Tensor> {
        self.const_value.as_ref()
    }

    /// Whether any attribute holds a nested graph
    pub fn has_subgraph(&self) -> bool {
        self.attrs.values().any(|v| matches!(v, AttrValue::Graph(_)))
    }

    /// Input count is only known at runtime
    pub fn is_dynamic_input(&self) -> bool {
        self.dynamic_inputs
    }

    /// Output count is only known at runtime
    pub fn is_dynamic_output(&self) -> bool {
        self.dynamic_outputs
    }

    /// Nodes with a control edge into this node
    pub fn control_inputs(&self) -> &[NodeId] {
        &self.control_inputs
    }

    /// Nodes this node has a control edge to
    pub fn control_outputs(&self) -> &[NodeId] {
        &self.control_outputs
    }

    /// Whether any control edge touches this node
    pub fn has_control_edges(&self) -> bool {
        !self.control_inputs.is_empty() || !self.control_outputs.is_empty()
    }
}

/// Description of a node to add to a graph
///
/// Defaults to one input and one output.
///
/// ```ignore
/// let conv = NodeDef::new("conv_0", "Conv")
///     .inputs(2)
///     .attr("group", 1i64)
///     .attr("pads", vec![0i64, 0, 0, 0]);
/// ```
#[derive(Debug, Clone)]
pub struct NodeDef {
    name: String,
    op_type: String,
    inputs: usize,
    outputs: usize,
    attrs: AttrMap,
    const_value: Option<Tensor>,
    dynamic_inputs: bool,
    dynamic_outputs: bool,
}

impl NodeDef {
    /// Describe a node with the given name and op type
    pub fn new(name: impl Into<String>, op_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            op_type: op_type.into(),
            inputs: 1,
            outputs: 1,
            attrs: AttrMap::default(),
            const_value: None,
            dynamic_inputs: false,
            dynamic_outputs: false,
        }
    }

    /// Set the number of input slots
    pub fn inputs(mut self, count: usize) -> Self {
        self.inputs = count;
        self
    }

    /// Set the number of output slots
    pub fn outputs(mut self, count: usize) -> Self {
        self.outputs = count;
        self
    }

    /// Add a named attribute
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.attrs.insert(name.into(), value.into());
        self
    }

    /// Attach a nested graph (control-flow body, function, ...)
    pub fn subgraph(mut self, name: impl Into<String>, graph: super::Graph) -> Self {
        self.attrs
            .insert(name.into(), AttrValue::Graph(std::sync::Arc::new(graph)));
        self
    }

    /// Set the materialized constant value
    pub fn const_value(mut self, value: Tensor) -> Self {
        self.const_value = Some(value);
        self
    }

    /// Mark the input count as runtime-determined
    pub fn dynamic_inputs(mut self) -> Self {
        self.dynamic_inputs = true;
        self
    }

    /// Mark the output count as runtime-determined
    pub fn dynamic_outputs(mut self) -> Self {
        self.dynamic_outputs = true;
        self
    }

    /// Node name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of input slots
    pub fn input_count(&self) -> usize {
        self.inputs
    }

    /// Number of output slots
    pub fn output_count(&self) -> usize {
        self.outputs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_id_range() {
        assert_eq!(NodeId::try_new(7), Some(NodeId::new(7)));
        assert_eq!(
            NodeId::try_new(NodeId::MAX_INDEX).map(NodeId::index),
            Some(NodeId::MAX_INDEX)
        );
        assert_eq!(NodeId::try_new(NodeId::MAX_INDEX + 1), None);
    }

    #[test]
    #[should_panic(expected = "exceeds the u32 handle range")]
    fn test_node_id_overflow_panics() {
        NodeId::new(NodeId::MAX_INDEX + 1);
    }

    #[test]
    fn test_port_helpers() {
        let id = NodeId::new(3);
        assert_eq!(id.index(), 3);
        assert_eq!(id.out(1), OutPort::new(id, 1));
        assert_eq!(id.input(0), InPort::new(id, 0));
        assert_eq!(id.out(1).to_string(), "%3:out1");
    }

    #[test]
    fn test_node_def_defaults() {
        let node = Node::from_def(NodeDef::new("relu_0", "Relu"));
        assert_eq!(node.input_count(), 1);
        assert_eq!(node.output_count(), 1);
        assert!(node.producer(0).is_none());
        assert!(node.consumers(0).is_empty());
        assert!(!node.has_subgraph());
        assert!(!node.has_control_edges());
    }

    #[test]
    fn test_node_def_builder() {
        let node = Node::from_def(
            NodeDef::new("split_0", "Split")
                .inputs(2)
                .outputs(3)
                .attr("axis", 1i64)
                .dynamic_outputs(),
        );
        assert_eq!(node.input_count(), 2);
        assert_eq!(node.output_count(), 3);
        assert_eq!(node.attribute("axis"), Some(&AttrValue::Int(1)));
        assert!(node.is_dynamic_output());
        assert!(!node.is_dynamic_input());
    }

    #[test]
    fn test_subgraph_attribute() {
        let body = super::super::Graph::new("body");
        let node = Node::from_def(NodeDef::new("if_0", "If").subgraph("then_branch", body));
        assert!(node.has_subgraph());
    }
}
