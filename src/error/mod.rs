//! Error types for fusion-matcher
//!
//! This module defines the errors returned by graph construction and by
//! queries on match results. Rejections during the search itself are never
//! surfaced as errors; a pattern that simply does not match yields no results.

use thiserror::Error;

use crate::graph::NodeId;

/// Direction of a port, used in diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortKind {
    /// Input slot of a node
    Input,
    /// Output slot of a node
    Output,
}

impl std::fmt::Display for PortKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PortKind::Input => f.write_str("input"),
            PortKind::Output => f.write_str("output"),
        }
    }
}

/// Main error type for graph construction and match queries
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// Lookup failed (pattern node not bound, unknown name, ...)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Node handle does not belong to the graph or was removed
    #[error("Invalid node: {0}")]
    InvalidNode(NodeId),

    /// The arena already holds as many nodes as a handle can address
    #[error("Node limit reached: a graph holds at most 2^32 nodes")]
    NodeLimit,

    /// A node with the same name already exists
    #[error("Duplicate node name: {0}")]
    DuplicateName(String),

    /// Port index outside the node's arity
    #[error("{kind} port {index} out of range for node {node} (arity {arity})")]
    PortOutOfRange {
        /// Node name
        node: String,
        /// Port direction
        kind: PortKind,
        /// Requested index
        index: usize,
        /// Actual arity
        arity: usize,
    },

    /// Input port already has a producer
    #[error("Input {index} of node {node} is already connected")]
    InputAlreadyConnected {
        /// Node name
        node: String,
        /// Input index
        index: usize,
    },

    /// Capture index outside the pattern's capture list
    #[error("Capture index {index} out of range ({len} captures declared)")]
    CaptureOutOfRange {
        /// Requested index
        index: usize,
        /// Number of declared captures
        len: usize,
    },

    /// Boundary of a match could not be derived
    #[error("Inconsistent boundary: {0}")]
    InconsistentBoundary(String),

    /// Replacement node does not fit the matched region
    #[error("Arity mismatch for {node}: expected {expected} {kind}s, found {found}")]
    ArityMismatch {
        /// Replacement node name
        node: String,
        /// Port direction
        kind: PortKind,
        /// Arity required by the boundary
        expected: usize,
        /// Arity of the replacement
        found: usize,
    },
}

/// Result type alias for graph operations
pub type GraphResult<T> = Result<T, GraphError>;
