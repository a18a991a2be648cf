//! Pattern templates
//!
//! A [`Pattern`] wraps a caller-built [`Graph`] describing the region to search
//! for. Graph inputs of the template become wildcards; every other node is
//! concrete and must be matched by a target node of the same op type.
//! The template's graph outputs are the region's declared outputs.

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::error::GraphResult;
use crate::graph::{Graph, InPort, Node, NodeId, OutPort};

use super::validator::{validate_pattern, PatternDefect};

/// Role of a node inside a pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeRole {
    /// Graph input placeholder; binds to whatever feeds the slot
    Wildcard,
    /// Must match a target node of the same op type
    Concrete,
}

/// Validated, immutable pattern template
///
/// Construction never fails: a structurally illegal template is logged once
/// and kept in a state where it never matches.
#[derive(Debug, Clone)]
pub struct Pattern {
    graph: Graph,
    defect: Option<PatternDefect>,
    roles: Vec<Option<NodeRole>>,
    concrete: Vec<NodeId>,
    slots: FxHashMap<NodeId, usize>,
    wildcard_uses: Vec<SmallVec<[InPort; 2]>>,
    captures: Vec<OutPort>,
    internal_outputs: Vec<OutPort>,
}

impl Pattern {
    /// Wrap a template graph, validating it
    pub fn new(graph: Graph) -> Self {
        Self::assemble(graph, Vec::new())
    }

    /// Start building a pattern with captures
    pub fn builder(graph: Graph) -> PatternBuilder {
        PatternBuilder::new(graph)
    }

    fn assemble(graph: Graph, captures: Vec<OutPort>) -> Self {
        let defect = validate_pattern(&graph).err();
        if let Some(defect) = &defect {
            tracing::warn!(pattern = %graph.name(), "Pattern is invalid: {defect}");
        }

        let mut roles = vec![None; graph.slot_count()];
        let mut concrete = Vec::new();
        for (id, _) in graph.nodes() {
            if graph.is_graph_input(id) {
                roles[id.index()] = Some(NodeRole::Wildcard);
            } else {
                roles[id.index()] = Some(NodeRole::Concrete);
                concrete.push(id);
            }
        }

        let slots: FxHashMap<NodeId, usize> = graph
            .inputs()
            .iter()
            .enumerate()
            .map(|(slot, &id)| (id, slot))
            .collect();

        // Uses of each wildcard, in concrete construction order then port order
        let mut wildcard_uses = vec![SmallVec::new(); slots.len()];
        for &id in &concrete {
            let Some(node) = graph.node(id) else { continue };
            for (index, feed) in node.inputs().iter().enumerate() {
                if let Some(slot) = feed.and_then(|f| slots.get(&f.node)) {
                    wildcard_uses[*slot].push(id.input(index));
                }
            }
        }

        let internal_outputs = graph
            .outputs()
            .iter()
            .copied()
            .filter(|port| roles[port.node.index()] == Some(NodeRole::Concrete))
            .filter(|port| !graph.consumers(*port).is_empty())
            .collect();

        Self {
            graph,
            defect,
            roles,
            concrete,
            slots,
            wildcard_uses,
            captures,
            internal_outputs,
        }
    }

    /// Template graph
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Template node by handle
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.graph.node(id)
    }

    /// Whether the template passed validation
    pub fn is_valid(&self) -> bool {
        self.defect.is_none()
    }

    /// Validation failure, if any
    pub fn defect(&self) -> Option<&PatternDefect> {
        self.defect.as_ref()
    }

    /// Role of a template node
    pub fn role(&self, id: NodeId) -> Option<NodeRole> {
        self.roles.get(id.index()).copied().flatten()
    }

    /// Check if a template node is concrete
    pub fn is_concrete(&self, id: NodeId) -> bool {
        self.role(id) == Some(NodeRole::Concrete)
    }

    /// Concrete nodes in construction order
    pub fn concrete_nodes(&self) -> &[NodeId] {
        &self.concrete
    }

    /// Wildcard nodes in input-slot order
    pub fn wildcard_nodes(&self) -> &[NodeId] {
        self.graph.inputs()
    }

    /// Input slot of a wildcard node
    pub fn wildcard_slot(&self, id: NodeId) -> Option<usize> {
        self.slots.get(&id).copied()
    }

    /// Concrete inputs fed by the wildcard in `slot`
    pub fn wildcard_uses(&self, slot: usize) -> &[InPort] {
        self.wildcard_uses
            .get(slot)
            .map(|u| u.as_slice())
            .unwrap_or(&[])
    }

    /// Declared outputs in declaration order
    pub fn outputs(&self) -> &[OutPort] {
        self.graph.outputs()
    }

    /// Check if a template port is a declared output
    pub fn is_declared_output(&self, port: OutPort) -> bool {
        self.graph.is_graph_output(port)
    }

    /// Declared outputs that are also consumed inside the template
    pub fn internal_outputs(&self) -> &[OutPort] {
        &self.internal_outputs
    }

    /// Registered captures in registration order
    pub fn captures(&self) -> &[OutPort] {
        &self.captures
    }

    /// Node the search starts from
    ///
    /// The node of the first declared output that is concrete, falling back to
    /// the last concrete node in construction order.
    pub fn anchor(&self) -> Option<NodeId> {
        self.outputs()
            .iter()
            .map(|port| port.node)
            .find(|&id| self.is_concrete(id))
            .or_else(|| self.concrete.last().copied())
    }
}

/// Builder for patterns that register captures
///
/// ```ignore
/// let pattern = Pattern::builder(graph)
///     .capture(abs.out(0))
///     .build()?;
/// ```
#[derive(Debug, Clone)]
pub struct PatternBuilder {
    graph: Graph,
    captures: Vec<OutPort>,
}

impl PatternBuilder {
    /// Create a new pattern builder
    pub fn new(graph: Graph) -> Self {
        Self {
            graph,
            captures: Vec::new(),
        }
    }

    /// Register a template tensor to resolve after each match
    pub fn capture(mut self, port: OutPort) -> Self {
        self.captures.push(port);
        self
    }

    /// Register several captures
    pub fn captures(mut self, ports: &[OutPort]) -> Self {
        self.captures.extend_from_slice(ports);
        self
    }

    /// Validate captures and build the pattern
    pub fn build(self) -> GraphResult<Pattern> {
        for &port in &self.captures {
            self.graph.check_output(port)?;
        }
        Ok(Pattern::assemble(self.graph, self.captures))
    }
}
