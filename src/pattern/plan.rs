//! Search plan for the matcher
//!
//! Orders the concrete nodes of a pattern so that every node after a scan
//! root is reached through an edge to a node placed before it. The walk is
//! breadth-first from the anchor: producers of each input in port order, then
//! consumers of each output in port and connection order. Concrete nodes not
//! connected to the anchor start a new scan root in construction order.

use std::collections::VecDeque;

use crate::graph::NodeId;

use super::template::Pattern;

/// How the target candidates for a plan step are found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Reach {
    /// Every target node with the same op type, in creation order
    Scan,
    /// The producer feeding `consumer`'s input `input` through output `output`
    Producer {
        consumer: NodeId,
        input: usize,
        output: usize,
    },
    /// Consumers reading `producer`'s output `output` at input `input`
    Consumer {
        producer: NodeId,
        output: usize,
        input: usize,
    },
}

/// One pattern node and how to reach it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PlanStep {
    pub node: NodeId,
    pub reach: Reach,
}

/// Ordered steps covering every concrete node exactly once
#[derive(Debug, Clone, Default)]
pub(crate) struct SearchPlan {
    steps: Vec<PlanStep>,
}

impl SearchPlan {
    pub fn build(pattern: &Pattern) -> Self {
        let graph = pattern.graph();
        let mut placed = vec![false; graph.slot_count()];
        let mut steps = Vec::with_capacity(pattern.concrete_nodes().len());

        let roots = pattern
            .anchor()
            .into_iter()
            .chain(pattern.concrete_nodes().iter().copied());

        for root in roots {
            if placed[root.index()] {
                continue;
            }
            placed[root.index()] = true;
            steps.push(PlanStep {
                node: root,
                reach: Reach::Scan,
            });

            let mut queue = VecDeque::from([root]);
            while let Some(current) = queue.pop_front() {
                let Some(node) = graph.node(current) else {
                    continue;
                };

                for (input, feed) in node.inputs().iter().enumerate() {
                    let Some(feed) = feed else { continue };
                    if !pattern.is_concrete(feed.node) || placed[feed.node.index()] {
                        continue;
                    }
                    placed[feed.node.index()] = true;
                    steps.push(PlanStep {
                        node: feed.node,
                        reach: Reach::Producer {
                            consumer: current,
                            input,
                            output: feed.index,
                        },
                    });
                    queue.push_back(feed.node);
                }

                for (output, consumers) in node.consumer_lists().enumerate() {
                    for dst in consumers {
                        if !pattern.is_concrete(dst.node) || placed[dst.node.index()] {
                            continue;
                        }
                        placed[dst.node.index()] = true;
                        steps.push(PlanStep {
                            node: dst.node,
                            reach: Reach::Consumer {
                                producer: current,
                                output,
                                input: dst.index,
                            },
                        });
                        queue.push_back(dst.node);
                    }
                }
            }
        }

        Self { steps }
    }

    pub fn steps(&self) -> &[PlanStep] {
        &self.steps
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}
