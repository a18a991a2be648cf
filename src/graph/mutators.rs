//! Graph mutation operations
//!
//! Methods for modifying the graph structure: adding and removing nodes,
//! connecting data and control edges, and declaring graph inputs/outputs.

use crate::error::{GraphError, GraphResult};

use super::attr::Tensor;
use super::context::Graph;
use super::node::{InPort, Node, NodeDef, NodeId, OutPort};
use super::ops;

impl Graph {
    // ========================================================================
    // Node mutation
    // ========================================================================

    /// Insert a new, unconnected node into the graph
    pub fn add_node(&mut self, def: NodeDef) -> GraphResult<NodeId> {
        if self.names.contains_key(def.name()) {
            return Err(GraphError::DuplicateName(def.name().to_string()));
        }

        let id = NodeId::try_new(self.nodes.len()).ok_or(GraphError::NodeLimit)?;
        self.names.insert(def.name().to_string(), id);
        self.nodes.push(Node::from_def(def));
        Ok(id)
    }

    /// Insert a node and connect `inputs[i]` to its input `i`
    pub fn add_op(&mut self, def: NodeDef, inputs: &[OutPort]) -> GraphResult<NodeId> {
        for &src in inputs {
            self.check_output(src)?;
        }

        let id = self.add_node(def)?;
        for (index, &src) in inputs.iter().enumerate() {
            self.connect(src, id.input(index))?;
        }
        Ok(id)
    }

    /// Add a graph input placeholder with a single output
    pub fn add_input(&mut self, name: impl Into<String>) -> GraphResult<NodeId> {
        let id = self.add_node(NodeDef::new(name, ops::DATA).inputs(0))?;
        self.inputs.push(id);
        Ok(id)
    }

    /// Add a constant node holding `value`
    pub fn add_const(&mut self, name: impl Into<String>, value: Tensor) -> GraphResult<NodeId> {
        self.add_node(NodeDef::new(name, ops::CONST).inputs(0).const_value(value))
    }

    /// Remove a node together with every edge touching it
    ///
    /// Consumers of the removed node are left with unconnected inputs, and any
    /// graph output it produced is dropped. The handle is never reused.
    pub fn remove_node(&mut self, id: NodeId) -> GraphResult<()> {
        let node = self.require(id)?.clone();

        for (index, feed) in node.inputs.iter().enumerate() {
            if let Some(src) = feed {
                self.unlink(*src, id.input(index));
            }
        }

        for consumers in &node.outputs {
            for dst in consumers {
                if let Some(slot) = self.nodes[dst.node.index()].inputs.get_mut(dst.index) {
                    *slot = None;
                }
            }
        }

        for &src in &node.control_inputs {
            self.nodes[src.index()].control_outputs.retain(|n| *n != id);
        }
        for &dst in &node.control_outputs {
            self.nodes[dst.index()].control_inputs.retain(|n| *n != id);
        }

        self.names.remove(node.name());
        self.inputs.retain(|n| *n != id);
        self.outputs.retain(|p| p.node != id);

        let slot = &mut self.nodes[id.index()];
        slot.inputs.iter_mut().for_each(|i| *i = None);
        slot.outputs.iter_mut().for_each(|c| c.clear());
        slot.control_inputs.clear();
        slot.control_outputs.clear();
        slot.removed = true;
        Ok(())
    }

    // ========================================================================
    // Edge mutation
    // ========================================================================

    /// Connect a data edge from `src` to `dst`
    pub fn connect(&mut self, src: OutPort, dst: InPort) -> GraphResult<()> {
        self.check_output(src)?;
        let consumer = self.check_input(dst)?;
        if consumer.producer(dst.index).is_some() {
            return Err(GraphError::InputAlreadyConnected {
                node: consumer.name.clone(),
                index: dst.index,
            });
        }

        self.nodes[dst.node.index()].inputs[dst.index] = Some(src);
        self.nodes[src.node.index()].outputs[src.index].push(dst);
        Ok(())
    }

    /// Disconnect the data edge feeding `dst`, returning its former producer
    pub fn disconnect(&mut self, dst: InPort) -> GraphResult<Option<OutPort>> {
        self.check_input(dst)?;
        let src = self.nodes[dst.node.index()].inputs[dst.index].take();
        if let Some(src) = src {
            self.nodes[src.node.index()].outputs[src.index].retain(|c| *c != dst);
        }
        Ok(src)
    }

    /// Add a control dependency from `src` to `dst`
    pub fn add_control_edge(&mut self, src: NodeId, dst: NodeId) -> GraphResult<()> {
        self.require(src)?;
        self.require(dst)?;

        if !self.nodes[src.index()].control_outputs.contains(&dst) {
            self.nodes[src.index()].control_outputs.push(dst);
            self.nodes[dst.index()].control_inputs.push(src);
        }
        Ok(())
    }

    fn unlink(&mut self, src: OutPort, dst: InPort) {
        if let Some(consumers) = self
            .nodes
            .get_mut(src.node.index())
            .and_then(|n| n.outputs.get_mut(src.index))
        {
            consumers.retain(|c| *c != dst);
        }
    }

    // ========================================================================
    // Graph output mutation
    // ========================================================================

    /// Declare an output port as a graph output
    pub fn add_output(&mut self, port: OutPort) -> GraphResult<()> {
        self.check_output(port)?;
        self.outputs.push(port);
        Ok(())
    }

    /// Replace the whole graph output list
    pub fn set_outputs(&mut self, outputs: Vec<OutPort>) -> GraphResult<()> {
        for &port in &outputs {
            self.check_output(port)?;
        }
        self.outputs = outputs;
        Ok(())
    }
}
