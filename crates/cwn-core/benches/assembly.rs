use criterion::{Criterion, criterion_group, criterion_main};
use cwn_core::config::SchemaConfig;
use cwn_core::extract::extract;
use cwn_core::graph::PlanGraph;
use serde_json::{Value, json};
use std::hint::black_box;

fn build_document(action_count: usize, indicator_count: usize) -> Value {
    let actions: Vec<Value> = (0..action_count)
        .map(|i| {
            json!({
                "id": format!("a{}", i),
                "name": format!("action {}", i),
                "relatedActions": [{"id": format!("a{}", (i + 1) % action_count)}]
            })
        })
        .collect();
    let levels: Vec<Value> = (0..indicator_count)
        .map(|i| {
            json!({
                "level": if i % 2 == 0 { "OPERATIONAL" } else { "STRATEGIC" },
                "indicator": {
                    "id": format!("i{}", i),
                    "name": format!("indicator {}", i),
                    "relatedActions": [{"action": {"id": format!("a{}", i % action_count)}}],
                    "relatedCauses": [
                        {"causalIndicator": {"id": format!("i{}", (i + 1) % indicator_count)}}
                    ]
                }
            })
        })
        .collect();
    json!({"data": {"plan": {
        "organization": {"name": "Benchmark City"},
        "actions": actions,
        "indicatorLevels": levels
    }}})
}

fn bench_extract_500(c: &mut Criterion) {
    let doc = build_document(400, 100);
    let schema = SchemaConfig::default();

    c.bench_function("extract_500_records", |b| {
        b.iter(|| extract(black_box(&doc), &schema).unwrap())
    });
}

fn bench_assemble_500(c: &mut Criterion) {
    let doc = build_document(400, 100);
    let extraction = extract(&doc, &SchemaConfig::default()).unwrap();

    c.bench_function("assemble_500_records", |b| {
        b.iter(|| PlanGraph::assemble(black_box(&extraction.nodes), black_box(&extraction.edges)))
    });
}

criterion_group!(benches, bench_extract_500, bench_assemble_500);
criterion_main!(benches);
