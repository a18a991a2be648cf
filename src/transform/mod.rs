//! Graph transformation module
//!
//! Rewrites built on top of pattern matches:
//!
//! - [`replace_match`]: swap one matched region for a single fused node
//! - [`fuse_all`]: match and fuse repeatedly until the pattern is gone
//!
//! # Example
//!
//! ```ignore
//! use fusion_matcher::transform::{fuse_all, replace_match};
//!
//! let mut matcher = PatternMatcher::new(pattern, Arc::new(graph.clone()));
//! if let Some(m) = matcher.match_next() {
//!     let fused = NodeDef::new("abs_exp_relu_0", "AbsExpRelu").outputs(2);
//!     replace_match(&mut graph, &m, fused)?;
//! }
//! ```

pub mod fuse;

pub use fuse::{fuse_all, replace_match, FusionResult};
