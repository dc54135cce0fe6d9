use criterion::{Criterion, criterion_group, criterion_main};
use serde_json::json;
use store::{FieldChange, InMemoryStore, ScanFilter, TransactionalStore, Version, WriteOp};

fn order_insert(id: usize) -> WriteOp {
    let id = format!("order-{id}");
    WriteOp::insert(
        "orders",
        id.clone(),
        json!({"id": id, "amount": 100, "customerId": "c1", "status": "PENDING", "version": 1}),
    )
}

fn bench_transact_single_insert(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("store/transact_single_insert", |b| {
        b.iter(|| {
            rt.block_on(async {
                let store = InMemoryStore::new();
                store.transact(vec![order_insert(0)]).await.unwrap();
            });
        });
    });
}

fn bench_transact_batch_10(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("store/transact_batch_10", |b| {
        b.iter(|| {
            rt.block_on(async {
                let store = InMemoryStore::new();
                let ops: Vec<WriteOp> = (0..10).map(order_insert).collect();
                store.transact(ops).await.unwrap();
            });
        });
    });
}

fn bench_versioned_update(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("store/versioned_update", |b| {
        b.iter(|| {
            rt.block_on(async {
                let store = InMemoryStore::new();
                store.transact(vec![order_insert(0)]).await.unwrap();
                let update = WriteOp::update(
                    "orders",
                    "order-0",
                    vec![
                        FieldChange::new("status", json!("CREATED")),
                        FieldChange::new("version", json!(2)),
                    ],
                )
                .expect_version(Version::first());
                store.transact(vec![update]).await.unwrap();
            });
        });
    });
}

fn bench_scan_1000(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = InMemoryStore::new();
    rt.block_on(async {
        let ops: Vec<WriteOp> = (0..1000).map(order_insert).collect();
        store.transact(ops).await.unwrap();
    });
    let filter = ScanFilter::new().where_eq("status", "PENDING");

    c.bench_function("store/scan_1000", |b| {
        b.iter(|| {
            rt.block_on(async {
                let items = store.scan("orders", &filter).await.unwrap();
                assert_eq!(items.len(), 1000);
            });
        });
    });
}

criterion_group!(
    benches,
    bench_transact_single_insert,
    bench_transact_batch_10,
    bench_versioned_update,
    bench_scan_1000
);
criterion_main!(benches);
