//! External interface of a matched region
//!
//! Built by [`MatchResult::to_subgraph_boundary`](super::MatchResult::to_subgraph_boundary);
//! every port is in target-graph coordinates.

use smallvec::SmallVec;

use crate::graph::OutPort;

/// Producers feeding one pattern input slot
///
/// One entry per pattern input that reads the slot, in the order those inputs
/// occur across the pattern's concrete nodes. For a valid match all entries are
/// the same port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubgraphInput {
    producers: SmallVec<[OutPort; 2]>,
}

impl SubgraphInput {
    pub(crate) fn new(producers: SmallVec<[OutPort; 2]>) -> Self {
        Self { producers }
    }

    /// Every observed producer of this slot
    pub fn producers(&self) -> &[OutPort] {
        &self.producers
    }

    /// The producer feeding this slot
    pub fn producer(&self) -> Option<OutPort> {
        self.producers.first().copied()
    }
}

/// Target port realizing one declared pattern output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubgraphOutput {
    port: OutPort,
}

impl SubgraphOutput {
    pub(crate) fn new(port: OutPort) -> Self {
        Self { port }
    }

    /// Target output port
    pub fn port(&self) -> OutPort {
        self.port
    }
}

/// Inputs and outputs of a matched region
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubgraphBoundary {
    inputs: Vec<SubgraphInput>,
    outputs: Vec<SubgraphOutput>,
}

impl SubgraphBoundary {
    pub(crate) fn new(inputs: Vec<SubgraphInput>, outputs: Vec<SubgraphOutput>) -> Self {
        Self { inputs, outputs }
    }

    /// Inputs in pattern-input order
    pub fn all_inputs(&self) -> &[SubgraphInput] {
        &self.inputs
    }

    /// Outputs in declaration order
    pub fn all_outputs(&self) -> &[SubgraphOutput] {
        &self.outputs
    }
}
