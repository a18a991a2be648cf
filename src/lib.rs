//! # Fusion Matcher
//!
//! Pattern-based subgraph matching for dataflow graphs.
//!
//! This crate finds every occurrence of a template subgraph inside a larger
//! dataflow graph so that the region can be handed to a fusion rewrite.
//!
//! ## Features
//!
//! - **Pattern Templates**: Describe the region as an ordinary graph; its graph
//!   inputs act as wildcards and its graph outputs are the region's outputs
//! - **Lazy Matching**: `PatternMatcher` yields one self-contained match per call,
//!   in a reproducible order
//! - **Boundaries**: Every match reports its external inputs and outputs
//! - **Fusion**: Replace a matched region with a single node
//!
//! ## Example
//!
//! ```ignore
//! use fusion_matcher::prelude::*;
//!
//! let pattern = Pattern::new(template);
//! for m in PatternMatcher::new(pattern, Arc::new(graph)) {
//!     let boundary = m.to_subgraph_boundary()?;
//!     // ...
//! }
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

// ============================================================================
// Module declarations
// ============================================================================

pub mod error;
pub mod graph;
pub mod pattern;
pub mod traits;
pub mod transform;

#[cfg(test)]
pub(crate) mod test_util;

// ============================================================================
// Prelude module for convenient imports
// ============================================================================

/// Prelude module - import commonly used types with `use fusion_matcher::prelude::*`
pub mod prelude {
    pub use crate::error::{GraphError, GraphResult};
    pub use crate::graph::{AttrValue, Graph, InPort, NodeDef, NodeId, OutPort, Tensor};
    pub use crate::pattern::{
        find_all_matches, MatchResult, MatcherConfig, Pattern, PatternMatcher, SubgraphBoundary,
    };
    pub use crate::traits::GraphModel;
    pub use crate::transform::{fuse_all, replace_match, FusionResult};
}

// ============================================================================
// Crate-level re-exports
// ============================================================================

pub use error::{GraphError, GraphResult};
pub use traits::GraphModel;

// ============================================================================
// Version information
// ============================================================================

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
