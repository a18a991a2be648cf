//! Graph model for dataflow graphs
//!
//! This module provides the core infrastructure for working with dataflow graphs:
//!
//! - [`Graph`]: Node arena with O(1) producer/consumer lookups
//! - [`Node`], [`NodeDef`]: Stored nodes and their construction descriptions
//! - [`OutPort`], [`InPort`]: `(node, index)` references to output and input slots
//! - [`AttrValue`], [`Tensor`]: Typed attribute values and constant payloads
//! - [`maps`]: Type definitions for graph storage
//!
//! # Example
//!
//! ```ignore
//! use fusion_matcher::graph::{Graph, NodeDef};
//!
//! let mut graph = Graph::new("model");
//! let x = graph.add_input("X")?;
//! let abs = graph.add_op(NodeDef::new("abs_0", "Abs"), &[x.out(0)])?;
//! let exp = graph.add_op(NodeDef::new("exp_0", "Exp"), &[abs.out(0)])?;
//! graph.add_output(exp.out(0))?;
//!
//! // Traverse graph
//! let producer = graph.producer(exp.input(0));
//! let consumers = graph.consumers(abs.out(0));
//! ```
//!
//! # Storage
//!
//! | Field | Description |
//! |-------|-------------|
//! | `nodes` | arena of nodes; removed nodes stay as tombstones |
//! | `names` | node name → handle |
//! | `Node::inputs` | input index → producer port |
//! | `Node::outputs` | output index → consumer ports |

pub mod attr;
pub mod context;
pub mod maps;
pub mod mutators;
pub mod node;
pub mod ops;

// Re-export main types
pub use attr::{AttrValue, Tensor};
pub use context::Graph;
pub use maps::{AttrMap, ConsumerList, NameMap, NodeSet};
pub use node::{InPort, Node, NodeDef, NodeId, OutPort};
