//! Benchmarks for the convergence loop.

use std::sync::Arc;
use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use serde_json::json;

use reconflow::prelude::*;
use reconflow::testing::MockOperation;

fn build_loop(operation: Arc<MockOperation>, limit: BatchLimit) -> ConvergenceLoop {
    let unique_key = UniqueKey::single("id");
    let classifier = StatusClassifier::new("generate_text_status");
    ConvergenceLoop::new(
        SourceRef::new("src"),
        Arc::new(IdentityRetry::new(unique_key.clone(), classifier.clone())),
        BatchInvoker::new(operation, ModelRef::new("m")),
        MergeWriter::new("out", unique_key, AcceptFilter::not_retryable(classifier)),
        EngineConfig::new(limit, Duration::from_secs(60)),
    )
}

fn seeded_warehouse(rt: &tokio::runtime::Runtime, rows: usize) -> anyhow::Result<MemoryWarehouse> {
    let source: Vec<Row> = (0..rows)
        .map(|i| {
            Row::new()
                .with("id", json!(format!("r{i}")))
                .with("content", json!("body"))
        })
        .collect();
    let warehouse = MemoryWarehouse::new().with_table("src", UniqueKey::single("id"), source);
    rt.block_on(warehouse.create_table("out", &UniqueKey::single("id"), vec![]))?;
    Ok(warehouse)
}

fn convergence_benchmark(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().expect("tokio runtime");

    c.bench_function("converge_1k_rows_batch_100", |b| {
        b.iter(|| {
            let warehouse = seeded_warehouse(&rt, 1000).expect("seeded warehouse");
            let operation = Arc::new(MockOperation::new(OperationKind::GenerateText));
            let driver = build_loop(operation, BatchLimit::Rows(100));
            let report = rt.block_on(driver.run(&warehouse)).expect("run");
            black_box(report.rows_written)
        })
    });

    c.bench_function("single_pass_1k_rows", |b| {
        b.iter(|| {
            let warehouse = seeded_warehouse(&rt, 1000).expect("seeded warehouse");
            let operation = Arc::new(MockOperation::new(OperationKind::GenerateText));
            let driver = build_loop(operation, BatchLimit::Unlimited);
            let report = rt.block_on(driver.run(&warehouse)).expect("run");
            black_box(report.iterations)
        })
    });
}

criterion_group!(benches, convergence_benchmark);
criterion_main!(benches);
