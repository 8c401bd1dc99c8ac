use criterion::{criterion_group, criterion_main, Criterion};
use recflow::prelude::{EngineConfig, Stream};
use recflow::{IterateOp, MergeOp, Operator};
use recflow_core::record::payloads_to_stream;
use serde_json::json;

fn make_orders(orders: usize, lines: usize) -> Stream {
    payloads_to_stream(
        (0..orders)
            .map(|i| {
                let ls: Vec<_> = (0..lines)
                    .map(|j| json!({ "sku": format!("sku-{}", j % 16), "qty": j, "meta": { "from": i } }))
                    .collect();
                json!({ "id": i, "customer": format!("c-{}", i % 8), "lines": ls })
            })
            .collect(),
    )
}

fn bench_iterate(c: &mut Criterion) {
    let input = make_orders(64, 32);
    let op = IterateOp::from_json(
        &json!({
            "iterationMode": "arrayField",
            "arrayField": "lines",
            "includeOriginalData": true,
            "options": { "flatten": true, "enableMemoryManagement": true, "maxArraySize": 0 }
        }),
        &EngineConfig::default(),
    )
    .unwrap();
    let inputs = [input];
    c.bench_function("iterate_array_field", |b| {
        b.iter(|| {
            let _ = op.eval(&inputs).unwrap();
        })
    });
}

fn bench_merge(c: &mut Criterion) {
    let left = payloads_to_stream((0..1024).map(|i| json!({ "id": i, "l": i })).collect());
    let right = payloads_to_stream((0..1024).rev().map(|i| json!({ "id": i, "r": i })).collect());
    let inputs = [left, right];
    let by_key = MergeOp::from_json(&json!({
        "mode": "mergeByKey",
        "mergeByKey": { "matchKey": "id", "joinMode": "outer" }
    }))
    .unwrap();
    c.bench_function("merge_by_key_outer", |b| {
        b.iter(|| {
            let _ = by_key.eval(&inputs).unwrap();
        })
    });

    let small = [inputs[0][..32].to_vec(), inputs[1][..32].to_vec()];
    let multiplex = MergeOp::from_json(&json!({ "mode": "multiplex" })).unwrap();
    c.bench_function("multiplex_32x32", |b| {
        b.iter(|| {
            let _ = multiplex.eval(&small).unwrap();
        })
    });
}

criterion_group!(operators, bench_iterate, bench_merge);
criterion_main!(operators);
