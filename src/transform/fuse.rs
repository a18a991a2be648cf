//! Region fusion
//!
//! Replaces a matched region with a single node that takes over its boundary.

use std::sync::Arc;

use crate::error::{GraphError, GraphResult, PortKind};
use crate::graph::{Graph, InPort, NodeDef, NodeId, NodeSet, OutPort};
use crate::pattern::{MatchResult, MatcherConfig, Pattern, PatternMatcher};

/// Result of a fusion operation
#[derive(Debug, Clone)]
pub struct FusionResult {
    /// Handle of the fused (new) node
    pub fused_node: NodeId,
    /// Names of nodes that were eliminated
    pub eliminated_nodes: Vec<String>,
    /// Number of external consumers moved onto the fused node
    pub rewired_consumers: usize,
}

/// Replace the region bound by `m` with a single node
///
/// Input `i` of the fused node is connected to the producer of pattern input
/// `i`; output `j` takes over every consumer outside the region and every
/// graph-output reference of declared output `j`. Control edges between the
/// region and the rest of the graph are moved onto the fused node. The graph is
/// left untouched if any check fails.
///
/// # Errors
/// * `ArityMismatch` if `replacement` does not have one input per pattern
///   input and one output per declared output
/// * `InconsistentBoundary` if a declared output is not produced inside the
///   region
/// * `InvalidNode` if a matched node no longer exists
/// * `DuplicateName` if the replacement name is taken by a node outside the
///   region
pub fn replace_match(
    graph: &mut Graph,
    m: &MatchResult,
    replacement: NodeDef,
) -> GraphResult<FusionResult> {
    let boundary = m.to_subgraph_boundary()?;
    let inputs: Vec<OutPort> = boundary
        .all_inputs()
        .iter()
        .filter_map(|i| i.producer())
        .collect();
    let outputs: Vec<OutPort> = boundary.all_outputs().iter().map(|o| o.port()).collect();

    if replacement.input_count() != inputs.len() {
        return Err(GraphError::ArityMismatch {
            node: replacement.name().to_string(),
            kind: PortKind::Input,
            expected: inputs.len(),
            found: replacement.input_count(),
        });
    }
    if replacement.output_count() != outputs.len() {
        return Err(GraphError::ArityMismatch {
            node: replacement.name().to_string(),
            kind: PortKind::Output,
            expected: outputs.len(),
            found: replacement.output_count(),
        });
    }

    let members: NodeSet = m.matched_nodes().into_iter().collect();
    let mut eliminated = Vec::with_capacity(members.len());
    for id in m.matched_nodes() {
        eliminated.push(graph.require(id)?.name().to_string());
    }

    for (j, port) in outputs.iter().enumerate() {
        if !members.contains(&port.node) {
            return Err(GraphError::InconsistentBoundary(format!(
                "output {j} is not produced inside the match"
            )));
        }
    }
    for &src in &inputs {
        graph.check_output(src)?;
    }
    if let Some(existing) = graph.node_id(replacement.name()) {
        if !members.contains(&existing) {
            return Err(GraphError::DuplicateName(replacement.name().to_string()));
        }
    }

    // Snapshot everything that refers to the region before tearing it down.
    // A port declared twice hands its consumers to the first fused output only.
    let external: Vec<Vec<InPort>> = outputs
        .iter()
        .enumerate()
        .map(|(j, &port)| {
            if outputs[..j].contains(&port) {
                return Vec::new();
            }
            graph
                .consumers(port)
                .iter()
                .copied()
                .filter(|dst| !members.contains(&dst.node))
                .collect()
        })
        .collect();
    let graph_outputs = graph.outputs().to_vec();

    let mut control_inputs: Vec<NodeId> = Vec::new();
    let mut control_outputs: Vec<NodeId> = Vec::new();
    for id in m.matched_nodes() {
        let node = graph.require(id)?;
        for &src in node.control_inputs() {
            if !members.contains(&src) && !control_inputs.contains(&src) {
                control_inputs.push(src);
            }
        }
        for &dst in node.control_outputs() {
            if !members.contains(&dst) && !control_outputs.contains(&dst) {
                control_outputs.push(dst);
            }
        }
    }

    for id in m.matched_nodes() {
        graph.remove_node(id)?;
    }

    let name = replacement.name().to_string();
    let fused = graph.add_op(replacement, &inputs)?;

    let mut rewired = 0;
    for (j, consumers) in external.iter().enumerate() {
        for &dst in consumers {
            graph.connect(fused.out(j), dst)?;
            rewired += 1;
        }
    }

    for &src in &control_inputs {
        graph.add_control_edge(src, fused)?;
    }
    for &dst in &control_outputs {
        graph.add_control_edge(fused, dst)?;
    }

    let remapped = graph_outputs
        .into_iter()
        .filter_map(|port| match outputs.iter().position(|o| *o == port) {
            Some(j) => Some(fused.out(j)),
            None if members.contains(&port.node) => None,
            None => Some(port),
        })
        .collect();
    graph.set_outputs(remapped)?;

    tracing::debug!(
        fused = %name,
        eliminated = eliminated.len(),
        rewired,
        "replaced matched region"
    );

    Ok(FusionResult {
        fused_node: fused,
        eliminated_nodes: eliminated,
        rewired_consumers: rewired,
    })
}

/// Repeatedly fuse the first match of `pattern` until none is left
///
/// `make_node` receives each match and its sequence number and returns the
/// replacement. The target is re-searched after every rewrite, so regions
/// created by an earlier fusion are found too. Stops after `max_rewrites`
/// fusions, with a warning if the pattern still matches. Returns the number of
/// fusions applied.
pub fn fuse_all<F>(
    graph: &mut Graph,
    pattern: &Pattern,
    config: MatcherConfig,
    max_rewrites: usize,
    mut make_node: F,
) -> GraphResult<usize>
where
    F: FnMut(&Graph, &MatchResult, usize) -> NodeDef,
{
    let mut applied = 0;

    loop {
        let snapshot = Arc::new(graph.clone());
        let found =
            PatternMatcher::with_config(pattern.clone(), snapshot.clone(), config).match_next();
        let Some(m) = found else {
            return Ok(applied);
        };
        if applied == max_rewrites {
            break;
        }

        let replacement = make_node(&snapshot, &m, applied);
        replace_match(graph, &m, replacement)?;
        applied += 1;
    }

    tracing::warn!(
        pattern = %pattern.graph().name(),
        max_rewrites,
        "rewrite limit reached with matches left"
    );
    Ok(applied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::AttrValue;
    use crate::test_util::capture_logs;

    /// data -> abs1 -> {exp1, relu1}, outputs [exp1, relu1]
    fn abs_exp_relu_pattern() -> Pattern {
        let mut graph = Graph::new("abs_exp_relu");
        let data = graph.add_input("data").unwrap();
        let abs = graph.add_op(NodeDef::new("abs1", "Abs"), &[data.out(0)]).unwrap();
        let exp = graph.add_op(NodeDef::new("exp1", "Exp"), &[abs.out(0)]).unwrap();
        let relu = graph.add_op(NodeDef::new("relu1", "Relu"), &[abs.out(0)]).unwrap();
        graph.add_output(exp.out(0)).unwrap();
        graph.add_output(relu.out(0)).unwrap();
        Pattern::new(graph)
    }

    /// data -> abs -> {exp, relu} -> add, plus relu as a graph output
    fn make_target() -> Graph {
        let mut graph = Graph::new("target");
        let data = graph.add_input("data").unwrap();
        let abs = graph.add_op(NodeDef::new("abs", "Abs"), &[data.out(0)]).unwrap();
        let exp = graph.add_op(NodeDef::new("exp", "Exp"), &[abs.out(0)]).unwrap();
        let relu = graph.add_op(NodeDef::new("relu", "Relu"), &[abs.out(0)]).unwrap();
        let add = graph
            .add_op(NodeDef::new("add", "Add").inputs(2), &[exp.out(0), relu.out(0)])
            .unwrap();
        graph.add_output(add.out(0)).unwrap();
        graph.add_output(relu.out(0)).unwrap();
        graph
    }

    fn first_match(graph: &Graph) -> MatchResult {
        PatternMatcher::new(abs_exp_relu_pattern(), Arc::new(graph.clone()))
            .match_next()
            .unwrap()
    }

    #[test]
    fn test_replace_match() {
        let mut graph = make_target();
        let m = first_match(&graph);

        let result = replace_match(&mut graph, &m, NodeDef::new("fused", "AbsExpRelu").outputs(2))
            .unwrap();

        assert_eq!(result.eliminated_nodes, vec!["abs", "exp", "relu"]);
        assert_eq!(result.rewired_consumers, 2);
        assert!(!graph.has_node("abs"));
        assert!(!graph.has_node("exp"));
        assert_eq!(graph.node_count(), 3);

        let fused = result.fused_node;
        let data = graph.node_id("data").unwrap();
        let add = graph.node_id("add").unwrap();
        assert_eq!(graph.producer(fused.input(0)), Some(data.out(0)));
        assert!(graph.are_connected(fused.out(0), add.input(0)));
        assert!(graph.are_connected(fused.out(1), add.input(1)));
        assert_eq!(graph.outputs(), &[add.out(0), fused.out(1)]);
    }

    #[test]
    fn test_replace_match_can_reuse_member_name() {
        let mut graph = make_target();
        let m = first_match(&graph);

        let result =
            replace_match(&mut graph, &m, NodeDef::new("abs", "AbsExpRelu").outputs(2)).unwrap();
        assert_eq!(graph.node_id("abs"), Some(result.fused_node));
    }

    #[test]
    fn test_replace_match_arity_mismatch() {
        let mut graph = make_target();
        let m = first_match(&graph);
        let before = graph.node_count();

        let err = replace_match(&mut graph, &m, NodeDef::new("fused", "AbsExpRelu")).unwrap_err();
        assert_eq!(
            err,
            GraphError::ArityMismatch {
                node: "fused".to_string(),
                kind: PortKind::Output,
                expected: 2,
                found: 1,
            }
        );

        let err = replace_match(
            &mut graph,
            &m,
            NodeDef::new("fused", "AbsExpRelu").inputs(2).outputs(2),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            GraphError::ArityMismatch {
                kind: PortKind::Input,
                ..
            }
        ));
        assert_eq!(graph.node_count(), before);
    }

    #[test]
    fn test_replace_match_duplicate_name() {
        let mut graph = make_target();
        let m = first_match(&graph);

        let err =
            replace_match(&mut graph, &m, NodeDef::new("add", "AbsExpRelu").outputs(2)).unwrap_err();
        assert_eq!(err, GraphError::DuplicateName("add".to_string()));
        assert!(graph.has_node("abs"));
    }

    #[test]
    fn test_replace_stale_match() {
        let mut graph = make_target();
        let m = first_match(&graph);

        replace_match(&mut graph, &m, NodeDef::new("fused", "AbsExpRelu").outputs(2)).unwrap();
        let err = replace_match(&mut graph, &m, NodeDef::new("again", "AbsExpRelu").outputs(2))
            .unwrap_err();
        assert!(matches!(err, GraphError::InvalidNode(_)));
    }

    /// data -> abs1, abs1 declared as output
    fn abs_pattern(declared: usize) -> Pattern {
        let mut graph = Graph::new("abs");
        let data = graph.add_input("data").unwrap();
        let abs = graph.add_op(NodeDef::new("abs1", "Abs"), &[data.out(0)]).unwrap();
        for _ in 0..declared {
            graph.add_output(abs.out(0)).unwrap();
        }
        Pattern::new(graph)
    }

    #[test]
    fn test_replace_match_moves_control_edges() {
        // pre ~> abs ~> other, data -> abs -> r
        let mut graph = Graph::new("target");
        let data = graph.add_input("data").unwrap();
        let pre = graph.add_op(NodeDef::new("pre", "Relu"), &[data.out(0)]).unwrap();
        let abs = graph.add_op(NodeDef::new("abs", "Abs"), &[data.out(0)]).unwrap();
        let r = graph.add_op(NodeDef::new("r", "Relu"), &[abs.out(0)]).unwrap();
        let other = graph.add_op(NodeDef::new("other", "Relu"), &[data.out(0)]).unwrap();
        graph.add_control_edge(pre, abs).unwrap();
        graph.add_control_edge(abs, other).unwrap();
        for id in [pre, r, other] {
            graph.add_output(id.out(0)).unwrap();
        }

        let m = PatternMatcher::new(abs_pattern(1), Arc::new(graph.clone()))
            .match_next()
            .unwrap();
        let fused = replace_match(&mut graph, &m, NodeDef::new("fused", "Abs"))
            .unwrap()
            .fused_node;

        let node = graph.node(fused).unwrap();
        assert_eq!(node.control_inputs(), &[pre]);
        assert_eq!(node.control_outputs(), &[other]);
        assert_eq!(graph.node(other).unwrap().control_inputs(), &[fused]);
        assert_eq!(graph.node(pre).unwrap().control_outputs(), &[fused]);
        assert!(graph.are_connected(fused.out(0), r.input(0)));
    }

    #[test]
    fn test_replace_match_repeated_output() {
        let mut graph = Graph::new("target");
        let data = graph.add_input("data").unwrap();
        let abs = graph.add_op(NodeDef::new("abs", "Abs"), &[data.out(0)]).unwrap();
        let r = graph.add_op(NodeDef::new("r", "Relu"), &[abs.out(0)]).unwrap();
        graph.add_output(r.out(0)).unwrap();
        graph.add_output(abs.out(0)).unwrap();

        let m = PatternMatcher::new(abs_pattern(2), Arc::new(graph.clone()))
            .match_next()
            .unwrap();
        let result =
            replace_match(&mut graph, &m, NodeDef::new("fused", "Abs").outputs(2)).unwrap();

        let fused = result.fused_node;
        assert_eq!(result.rewired_consumers, 1);
        assert!(graph.are_connected(fused.out(0), r.input(0)));
        assert!(graph.consumers(fused.out(1)).is_empty());
        assert_eq!(graph.outputs(), &[r.out(0), fused.out(0)]);
    }

    #[test]
    fn test_fuse_all() {
        // Three independent occurrences side by side
        let mut graph = Graph::new("target");
        for i in 0..3 {
            let data = graph.add_input(format!("data_{i}")).unwrap();
            let abs = graph
                .add_op(NodeDef::new(format!("abs_{i}"), "Abs"), &[data.out(0)])
                .unwrap();
            let exp = graph
                .add_op(NodeDef::new(format!("exp_{i}"), "Exp"), &[abs.out(0)])
                .unwrap();
            let relu = graph
                .add_op(NodeDef::new(format!("relu_{i}"), "Relu"), &[abs.out(0)])
                .unwrap();
            graph.add_output(exp.out(0)).unwrap();
            graph.add_output(relu.out(0)).unwrap();
        }

        let pattern = abs_exp_relu_pattern();
        let applied = fuse_all(
            &mut graph,
            &pattern,
            MatcherConfig::default(),
            10,
            |target, m, n| {
                let abs = target.node(m.matched_nodes()[0]).unwrap();
                NodeDef::new(format!("fused_{n}"), "AbsExpRelu")
                    .outputs(2)
                    .attr("source", abs.name())
            },
        )
        .unwrap();

        assert_eq!(applied, 3);
        assert_eq!(graph.find_nodes_by_op("AbsExpRelu").len(), 3);
        assert!(graph.find_nodes_by_op("Abs").is_empty());
        assert_eq!(graph.outputs().len(), 6);
        assert_eq!(
            graph.get_node("fused_0").unwrap().attribute("source"),
            Some(&AttrValue::String("abs_0".to_string()))
        );
    }

    #[test]
    fn test_fuse_all_respects_limit() {
        // Relu -> Relu rewritten into Relu keeps matching on a long chain
        let mut graph = Graph::new("chain");
        let mut prev = graph.add_input("data").unwrap().out(0);
        for i in 0..6 {
            prev = graph
                .add_op(NodeDef::new(format!("relu_{i}"), "Relu"), &[prev])
                .unwrap()
                .out(0);
        }
        graph.add_output(prev).unwrap();

        let mut template = Graph::new("pair");
        let data = template.add_input("data").unwrap();
        let a = template.add_op(NodeDef::new("a", "Relu"), &[data.out(0)]).unwrap();
        let b = template.add_op(NodeDef::new("b", "Relu"), &[a.out(0)]).unwrap();
        template.add_output(b.out(0)).unwrap();

        let (applied, logs) = capture_logs(|| {
            fuse_all(
                &mut graph,
                &Pattern::new(template),
                MatcherConfig::default(),
                2,
                |_, _, n| NodeDef::new(format!("merged_{n}"), "Relu"),
            )
        });

        assert_eq!(applied.unwrap(), 2);
        assert_eq!(graph.find_nodes_by_op("Relu").len(), 4);
        assert!(logs.contains("rewrite limit reached"));
    }

    #[test]
    fn test_fuse_all_limit_warning_only_with_matches_left() {
        let make_graph = || {
            let mut graph = Graph::new("target");
            let data = graph.add_input("data").unwrap();
            for i in 0..2 {
                let abs = graph
                    .add_op(NodeDef::new(format!("abs_{i}"), "Abs"), &[data.out(0)])
                    .unwrap();
                graph.add_output(abs.out(0)).unwrap();
            }
            graph
        };
        let fuse = |graph: &mut Graph, limit| {
            fuse_all(graph, &abs_pattern(1), MatcherConfig::default(), limit, |_, _, n| {
                NodeDef::new(format!("fused_{n}"), "FusedAbs")
            })
        };

        // Exactly as many occurrences as the limit
        let mut graph = make_graph();
        let (applied, logs) = capture_logs(|| fuse(&mut graph, 2));
        assert_eq!(applied.unwrap(), 2);
        assert!(!logs.contains("rewrite limit reached"));

        // Zero limit on a graph without occurrences
        let mut graph = Graph::new("empty");
        graph.add_input("data").unwrap();
        let (applied, logs) = capture_logs(|| fuse(&mut graph, 0));
        assert_eq!(applied.unwrap(), 0);
        assert!(logs.is_empty());

        // Zero limit with occurrences left
        let mut graph = make_graph();
        let (applied, logs) = capture_logs(|| fuse(&mut graph, 0));
        assert_eq!(applied.unwrap(), 0);
        assert!(logs.contains("rewrite limit reached"));
        assert_eq!(graph.find_nodes_by_op("Abs").len(), 2);
    }
}
