//! Fetch latency benchmarks.
//!
//! Measures the resident fast path, lease churn, and loads that force an
//! eviction.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use futures::FutureExt;

use gg_vram::{ManagerConfig, ModelManager, PriorityClass};

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .unwrap()
}

fn manager(budget_mb: u64, models: &[(&str, u64)]) -> ModelManager<u64> {
    let manager = ModelManager::new(ManagerConfig::with_budget_mb(budget_mb));
    for (i, (id, cost)) in models.iter().enumerate() {
        let handle = i as u64;
        manager
            .register_fn(
                *id,
                *cost,
                PriorityClass::Medium,
                move || async move { Ok(handle) }.boxed(),
                |_| async { Ok(()) }.boxed(),
                true,
            )
            .unwrap();
    }
    manager
}

fn bench_resident_fetch(c: &mut Criterion) {
    let rt = runtime();
    let mut group = c.benchmark_group("resident_fetch");

    for count in [1usize, 8, 64] {
        let ids: Vec<String> = (0..count).map(|i| format!("model-{i}")).collect();
        let models: Vec<(&str, u64)> = ids.iter().map(|id| (id.as_str(), 10)).collect();
        let manager = manager(10_000, &models);
        rt.block_on(async {
            for id in &ids {
                manager.fetch(id).await.unwrap();
            }
        });

        let (manager, id) = (&manager, ids[0].as_str());
        group.throughput(Throughput::Elements(1));
        group.bench_function(BenchmarkId::new("fetch", count), |b| {
            b.to_async(&rt)
                .iter(|| async move { black_box(manager.fetch(id).await.unwrap()) })
        });
    }

    group.finish();
}

fn bench_lease_churn(c: &mut Criterion) {
    let rt = runtime();
    let manager = manager(1000, &[("pose", 100)]);
    rt.block_on(manager.fetch("pose")).unwrap();
    let manager = &manager;

    c.bench_function("acquire_release", |b| {
        b.to_async(&rt).iter(|| async move {
            let lease = manager.acquire("pose").await.unwrap();
            black_box(*lease);
        })
    });
}

fn bench_evicting_load(c: &mut Criterion) {
    let rt = runtime();
    // Two models that cannot be resident together.
    let manager = manager(1000, &[("a", 600), ("b", 600)]);

    c.bench_function("evicting_load", |b| {
        let mut flip = false;
        b.to_async(&rt).iter(|| {
            flip = !flip;
            let id = if flip { "a" } else { "b" };
            let manager = manager.clone();
            async move { black_box(manager.fetch(id).await.unwrap()) }
        })
    });
}

criterion_group!(
    benches,
    bench_resident_fetch,
    bench_lease_churn,
    bench_evicting_load
);
criterion_main!(benches);
