//! Subgraph pattern matching
//!
//! This module finds occurrences of a template subgraph inside a target graph,
//! the first step of any fusion rewrite.
//!
//! # Overview
//!
//! The matching pipeline is:
//! 1. Build the template as an ordinary [`Graph`](crate::graph::Graph): its
//!    graph inputs are wildcards, every other node is concrete, and its graph
//!    outputs are the region's declared outputs
//! 2. Wrap it in a [`Pattern`], which validates it once
//! 3. Drive a [`PatternMatcher`] over a shared target; each call yields one
//!    self-contained [`MatchResult`]
//! 4. Derive the region's [`SubgraphBoundary`] to rewrite it
//!
//! # Example
//!
//! ```ignore
//! use fusion_matcher::pattern::{Pattern, PatternMatcher};
//!
//! let mut template = Graph::new("abs_exp_relu");
//! let data = template.add_input("data")?;
//! let abs = template.add_op(NodeDef::new("abs1", "Abs"), &[data.out(0)])?;
//! let exp = template.add_op(NodeDef::new("exp1", "Exp"), &[abs.out(0)])?;
//! let relu = template.add_op(NodeDef::new("relu1", "Relu"), &[abs.out(0)])?;
//! template.add_output(exp.out(0))?;
//! template.add_output(relu.out(0))?;
//!
//! let matcher = PatternMatcher::new(Pattern::new(template), Arc::new(target));
//! for m in matcher {
//!     let boundary = m.to_subgraph_boundary()?;
//!     println!("{} inputs, {} outputs", boundary.all_inputs().len(), boundary.all_outputs().len());
//! }
//! ```

pub mod boundary;
pub mod config;
pub mod matcher;
pub(crate) mod plan;
pub mod result;
pub mod template;
pub mod validator;

// Re-export main types
pub use boundary::{SubgraphBoundary, SubgraphInput, SubgraphOutput};
pub use config::{MatcherConfig, MatcherConfigBuilder};
pub use matcher::{find_all_matches, PatternMatcher};
pub use result::MatchResult;
pub use template::{NodeRole, Pattern, PatternBuilder};
pub use validator::{validate_pattern, PatternDefect};
