//! Benchmark for pattern matching
//!
//! Run with: cargo bench

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use fusion_matcher::graph::{Graph, NodeDef};
use fusion_matcher::pattern::{MatcherConfig, Pattern, PatternMatcher};

/// `blocks` copies of data -> abs -> {exp, relu} -> add, chained through add
fn make_target(blocks: usize) -> Graph {
    let mut graph = Graph::new("bench");
    let mut prev = graph.add_input("data").unwrap().out(0);
    for i in 0..blocks {
        let abs = graph
            .add_op(NodeDef::new(format!("abs_{i}"), "Abs"), &[prev])
            .unwrap();
        let exp = graph
            .add_op(NodeDef::new(format!("exp_{i}"), "Exp"), &[abs.out(0)])
            .unwrap();
        let relu = graph
            .add_op(NodeDef::new(format!("relu_{i}"), "Relu"), &[abs.out(0)])
            .unwrap();
        prev = graph
            .add_op(
                NodeDef::new(format!("add_{i}"), "Add").inputs(2),
                &[exp.out(0), relu.out(0)],
            )
            .unwrap()
            .out(0);
    }
    graph.add_output(prev).unwrap();
    graph
}

fn make_pattern() -> Pattern {
    let mut graph = Graph::new("abs_exp_relu");
    let data = graph.add_input("data").unwrap();
    let abs = graph.add_op(NodeDef::new("abs1", "Abs"), &[data.out(0)]).unwrap();
    let exp = graph.add_op(NodeDef::new("exp1", "Exp"), &[abs.out(0)]).unwrap();
    let relu = graph.add_op(NodeDef::new("relu1", "Relu"), &[abs.out(0)]).unwrap();
    graph.add_output(exp.out(0)).unwrap();
    graph.add_output(relu.out(0)).unwrap();
    Pattern::new(graph)
}

fn match_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("match_all");
    for blocks in [16, 256, 4096] {
        let target = Arc::new(make_target(blocks));
        group.bench_with_input(BenchmarkId::from_parameter(blocks), &target, |b, target| {
            b.iter(|| {
                let matcher = PatternMatcher::with_config(
                    make_pattern(),
                    Arc::clone(target),
                    MatcherConfig::default(),
                );
                black_box(matcher.count())
            })
        });
    }
    group.finish();
}

criterion_group!(benches, match_benchmark);
criterion_main!(benches);
