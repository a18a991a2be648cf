//! Pattern matching engine for dataflow graphs
//!
//! Enumerates every placement of a pattern's concrete nodes onto a target
//! graph, one match per call. The search is a backtracking walk over a fixed
//! [`SearchPlan`]: the first step scans the target for the anchor's op type,
//! each following step is reached through an edge to an already bound node.
//! The cursor is kept between calls, so matches are produced lazily and in a
//! reproducible order.

use std::iter::FusedIterator;
use std::sync::Arc;

use indexmap::IndexMap;
use smallvec::SmallVec;

use crate::graph::{ops, Graph, Node, NodeId, NodeSet, OutPort};
use crate::traits::GraphModel;

use super::boundary::{SubgraphInput, SubgraphOutput};
use super::config::MatcherConfig;
use super::plan::{PlanStep, Reach, SearchPlan};
use super::result::MatchResult;
use super::template::Pattern;

/// Pattern matcher over a shared target graph
///
/// ```ignore
/// let mut matcher = PatternMatcher::new(pattern, Arc::new(graph));
/// while let Some(m) = matcher.match_next() {
///     let boundary = m.to_subgraph_boundary()?;
///     // ...
/// }
/// ```
///
/// The sequence of matches is finite and not restartable; build a new matcher
/// to search again. `match_next` takes `&mut self`, so a matcher is driven by
/// one owner at a time, while several matchers may share one target.
pub struct PatternMatcher<G: GraphModel = Graph> {
    pattern: Pattern,
    graph: Arc<G>,
    config: MatcherConfig,
    plan: SearchPlan,
    cursor: Cursor,
}

impl<G: GraphModel> PatternMatcher<G> {
    /// Create a matcher with the default configuration
    pub fn new(pattern: Pattern, graph: Arc<G>) -> Self {
        Self::with_config(pattern, graph, MatcherConfig::default())
    }

    /// Create a matcher with an explicit configuration
    pub fn with_config(pattern: Pattern, graph: Arc<G>, config: MatcherConfig) -> Self {
        let plan = SearchPlan::build(&pattern);
        let searchable = pattern.is_valid() && outputs_allowed(&pattern, &config);
        if pattern.is_valid() && plan.is_empty() {
            tracing::debug!(
                pattern = %pattern.graph().name(),
                "pattern has no concrete node, nothing to match"
            );
        }

        let cursor = Cursor::new(pattern.graph().slot_count(), searchable && !plan.is_empty());
        Self {
            pattern,
            graph,
            config,
            plan,
            cursor,
        }
    }

    /// Find the next match, or `None` once the search space is exhausted
    pub fn match_next(&mut self) -> Option<MatchResult> {
        let search = Search {
            pattern: &self.pattern,
            graph: &*self.graph,
            config: &self.config,
            plan: &self.plan,
        };

        while self.cursor.next_binding(&search) {
            if let Some(result) = search.seal(&self.cursor.bound) {
                tracing::debug!(
                    pattern = %self.pattern.graph().name(),
                    nodes = result.len(),
                    "pattern matched"
                );
                return Some(result);
            }
        }
        None
    }

    /// Pattern being searched for
    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    /// Target graph
    pub fn graph(&self) -> &Arc<G> {
        &self.graph
    }

    /// Active configuration
    pub fn config(&self) -> &MatcherConfig {
        &self.config
    }

    /// Whether the search has finished
    pub fn is_exhausted(&self) -> bool {
        self.cursor.exhausted
    }
}

impl<G: GraphModel> Iterator for PatternMatcher<G> {
    type Item = MatchResult;

    fn next(&mut self) -> Option<Self::Item> {
        self.match_next()
    }
}

impl<G: GraphModel> FusedIterator for PatternMatcher<G> {}

/// Collect every match of `pattern` in `graph`
pub fn find_all_matches<G: GraphModel>(
    pattern: Pattern,
    graph: Arc<G>,
    config: MatcherConfig,
) -> Vec<MatchResult> {
    PatternMatcher::with_config(pattern, graph, config).collect()
}

/// Declared outputs consumed inside the template need `force_self_contained`
fn outputs_allowed(pattern: &Pattern, config: &MatcherConfig) -> bool {
    if config.force_self_contained() {
        return true;
    }
    let Some(port) = pattern.internal_outputs().first() else {
        return true;
    };

    let node = pattern.node(port.node).map(Node::name).unwrap_or_default();
    tracing::warn!(
        pattern = %pattern.graph().name(),
        "Output {} of node {node} is consumed inside the pattern; \
         declaring it requires force_self_contained",
        port.index
    );
    false
}

// ============================================================================
// Search cursor
// ============================================================================

/// Candidates for one plan step and the position of the next one to try
#[derive(Debug)]
struct Frame {
    candidates: Vec<NodeId>,
    next: usize,
}

impl Frame {
    fn new(candidates: Vec<NodeId>) -> Self {
        Self {
            candidates,
            next: 0,
        }
    }
}

/// Backtracking state kept between `match_next` calls
///
/// `frames[d]` holds the candidates of plan step `d`; `bound` maps each
/// pattern node (by arena index) to its current target node.
#[derive(Debug)]
struct Cursor {
    frames: Vec<Frame>,
    bound: Vec<Option<NodeId>>,
    started: bool,
    exhausted: bool,
}

impl Cursor {
    fn new(slots: usize, searchable: bool) -> Self {
        Self {
            frames: Vec::new(),
            bound: vec![None; slots],
            started: false,
            exhausted: !searchable,
        }
    }

    /// Advance to the next complete binding of every plan step
    fn next_binding<G: GraphModel>(&mut self, search: &Search<'_, G>) -> bool {
        if self.exhausted {
            return false;
        }
        let steps = search.plan.steps();

        if !self.started {
            self.started = true;
            self.frames
                .push(Frame::new(search.candidates(&steps[0], &self.bound)));
        }

        while let Some(depth) = self.frames.len().checked_sub(1) {
            let step = steps[depth];
            self.bound[step.node.index()] = None;

            let frame = &mut self.frames[depth];
            let mut placed = None;
            while let Some(&candidate) = frame.candidates.get(frame.next) {
                frame.next += 1;
                if search.admits(step.node, candidate, &self.bound) {
                    placed = Some(candidate);
                    break;
                }
            }

            let Some(candidate) = placed else {
                self.frames.pop();
                continue;
            };
            self.bound[step.node.index()] = Some(candidate);

            if depth + 1 == steps.len() {
                return true;
            }
            let next = search.candidates(&steps[depth + 1], &self.bound);
            self.frames.push(Frame::new(next));
        }

        tracing::debug!(pattern = %search.pattern.graph().name(), "search exhausted");
        self.exhausted = true;
        false
    }
}

// ============================================================================
// Candidate checks
// ============================================================================

/// Borrowed view of everything a search step reads
struct Search<'a, G> {
    pattern: &'a Pattern,
    graph: &'a G,
    config: &'a MatcherConfig,
    plan: &'a SearchPlan,
}

impl<G: GraphModel> Search<'_, G> {
    fn target(bound: &[Option<NodeId>], id: NodeId) -> Option<NodeId> {
        bound.get(id.index()).copied().flatten()
    }

    /// Target nodes that could stand for `step.node`
    fn candidates(&self, step: &PlanStep, bound: &[Option<NodeId>]) -> Vec<NodeId> {
        match step.reach {
            Reach::Scan => {
                let Some(op_type) = self.pattern.node(step.node).map(Node::op_type) else {
                    return Vec::new();
                };
                self.graph
                    .node_ids()
                    .filter(|&id| self.graph.op_type(id) == Some(op_type))
                    .collect()
            }
            Reach::Producer {
                consumer,
                input,
                output,
            } => Self::target(bound, consumer)
                .and_then(|t| self.graph.producer(t.input(input)))
                .filter(|src| src.index == output)
                .map(|src| vec![src.node])
                .unwrap_or_default(),
            Reach::Consumer {
                producer,
                output,
                input,
            } => match Self::target(bound, producer) {
                Some(t) => self
                    .graph
                    .consumers(t.out(output))
                    .iter()
                    .filter(|dst| dst.index == input)
                    .map(|dst| dst.node)
                    .collect(),
                None => Vec::new(),
            },
        }
    }

    /// Check a candidate for pattern node `id` against the partial binding
    fn admits(&self, id: NodeId, candidate: NodeId, bound: &[Option<NodeId>]) -> bool {
        let Some(node) = self.pattern.node(id) else {
            return false;
        };

        if bound.contains(&Some(candidate)) {
            tracing::trace!(pattern_node = %node.name(), %candidate, "target node already bound");
            return false;
        }

        self.node_matches(node, candidate) && self.edges_consistent(id, node, candidate, bound)
    }

    /// Node-local constraints: op type, arity, attributes, constant value
    fn node_matches(&self, node: &Node, candidate: NodeId) -> bool {
        if self.graph.op_type(candidate) != Some(node.op_type()) {
            return false;
        }

        if self.graph.input_count(candidate) != node.input_count()
            || self.graph.output_count(candidate) != node.output_count()
        {
            tracing::trace!(pattern_node = %node.name(), %candidate, "port arity mismatch");
            return false;
        }

        if self.config.ir_attr_match() {
            for (name, value) in node.attributes() {
                if self.graph.attribute(candidate, name) != Some(value) {
                    tracing::trace!(
                        pattern_node = %node.name(),
                        %candidate,
                        attr = %name,
                        "attribute mismatch"
                    );
                    return false;
                }
            }
        }

        if self.config.const_value_match() && ops::is_constant_op(node.op_type()) {
            if let Some(expected) = node.const_value() {
                if self.graph.const_value(candidate) != Some(expected) {
                    tracing::trace!(pattern_node = %node.name(), %candidate, "constant value mismatch");
                    return false;
                }
            }
        }

        true
    }

    /// Every pattern edge touching `id` must exist between the bound targets
    fn edges_consistent(
        &self,
        id: NodeId,
        node: &Node,
        candidate: NodeId,
        bound: &[Option<NodeId>],
    ) -> bool {
        // Target of a pattern node, treating `id` as bound to `candidate`
        let target = |p: NodeId| {
            if p == id {
                Some(candidate)
            } else {
                Self::target(bound, p)
            }
        };

        for (index, feed) in node.inputs().iter().enumerate() {
            let actual = self.graph.producer(candidate.input(index));
            let Some(feed) = feed else {
                // Unconnected template inputs only match unconnected target inputs
                if actual.is_some() {
                    return false;
                }
                continue;
            };
            let Some(actual) = actual else {
                return false;
            };

            if self.pattern.is_concrete(feed.node) {
                if let Some(src) = target(feed.node) {
                    if actual != src.out(feed.index) {
                        return false;
                    }
                }
            } else if let Some(slot) = self.pattern.wildcard_slot(feed.node) {
                // All readers of one wildcard must see the same producer
                for other in self.pattern.wildcard_uses(slot) {
                    let Some(t) = target(other.node) else { continue };
                    if self.graph.producer(t.input(other.index)) != Some(actual) {
                        tracing::trace!(
                            pattern_node = %node.name(),
                            %candidate,
                            slot,
                            "shared input bound to different producers"
                        );
                        return false;
                    }
                }
            }
        }

        for (output, consumers) in node.consumer_lists().enumerate() {
            for dst in consumers {
                if !self.pattern.is_concrete(dst.node) {
                    continue;
                }
                let Some(t) = Self::target(bound, dst.node) else {
                    continue;
                };
                if self.graph.producer(t.input(dst.index)) != Some(candidate.out(output)) {
                    return false;
                }
            }
        }

        true
    }

    /// Accept a complete binding and snapshot it, or reject it
    fn seal(&self, bound: &[Option<NodeId>]) -> Option<MatchResult> {
        let concrete = self.pattern.concrete_nodes();
        let members: NodeSet = concrete
            .iter()
            .filter_map(|&p| Self::target(bound, p))
            .collect();

        let mut inputs = Vec::with_capacity(self.pattern.wildcard_nodes().len());
        for slot in 0..self.pattern.wildcard_nodes().len() {
            let mut producers = SmallVec::new();
            for dst in self.pattern.wildcard_uses(slot) {
                let src = Self::target(bound, dst.node)
                    .and_then(|t| self.graph.producer(t.input(dst.index)))?;
                if members.contains(&src.node) {
                    tracing::trace!(slot, "pattern input fed from inside the match");
                    return None;
                }
                producers.push(src);
            }
            inputs.push(SubgraphInput::new(producers));
        }

        for &p in concrete {
            let t = Self::target(bound, p)?;
            for output in 0..self.graph.output_count(t) {
                if self.pattern.is_declared_output(p.out(output)) {
                    continue;
                }
                let port = t.out(output);
                let escapes = self.graph.is_graph_output(port)
                    || self
                        .graph
                        .consumers(port)
                        .iter()
                        .any(|dst| !members.contains(&dst.node));
                if escapes {
                    tracing::trace!(
                        node = self.graph.node_name(t).unwrap_or_default(),
                        output,
                        "match is not self-contained"
                    );
                    return None;
                }
            }
        }

        let resolve = |port: OutPort| -> Option<OutPort> {
            if self.pattern.is_concrete(port.node) {
                Self::target(bound, port.node).map(|t| t.out(port.index))
            } else {
                let slot = self.pattern.wildcard_slot(port.node)?;
                inputs.get(slot).and_then(SubgraphInput::producer)
            }
        };

        let outputs = self
            .pattern
            .outputs()
            .iter()
            .map(|&port| resolve(port).map(SubgraphOutput::new))
            .collect::<Option<Vec<_>>>()?;
        let captures = self
            .pattern
            .captures()
            .iter()
            .map(|&port| resolve(port))
            .collect::<Option<Vec<_>>>()?;
        let bindings = concrete
            .iter()
            .map(|&p| Self::target(bound, p).map(|t| (p, t)))
            .collect::<Option<IndexMap<_, _>>>()?;

        Some(MatchResult::new(bindings, inputs, outputs, captures))
    }
}
