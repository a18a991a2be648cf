//! Graph map and list types
//!
//! Defines the storage types shared by the graph arena and the matcher.

use indexmap::IndexMap;
use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

use super::attr::AttrValue;
use super::node::{InPort, NodeId};

/// Consumers of one output port
/// SmallVec optimized for common case of 1-4 consumers
pub type ConsumerList = SmallVec<[InPort; 4]>;

/// Type alias for attribute map: attribute name → value (order preserved)
pub type AttrMap = IndexMap<String, AttrValue>;

/// Type alias for name map: node name → node handle
pub type NameMap = FxHashMap<String, NodeId>;

/// Set of node handles
pub type NodeSet = FxHashSet<NodeId>;
