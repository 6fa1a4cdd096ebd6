//! # Bucu Core Benchmarks
//!
//! | Service | Operation |
//! |---------|-----------|
//! | Event bus | emit with 1..64 listeners |
//! | State store | set/get hot keys, sweep of expired entries |
//! | Module loader | dependency ordering of a chain |

use bc_01_state_store::StateStore;
use bc_03_module_loader::{resolve_order, ModuleDescriptor};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use serde_json::json;
use shared_bus::{EventBus, Listener};
use shared_types::{ConfigSource, ConfigTree, ManualTimeSource};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

// ============================================================================
// EVENT BUS
// ============================================================================

fn bench_bus_emit(c: &mut Criterion) {
    let mut group = c.benchmark_group("event-bus");
    let config: Arc<dyn ConfigSource> = Arc::new(
        ConfigTree::from_value(json!({ "rate_limit": { "enabled": false } })).unwrap(),
    );
    let clock = Arc::new(ManualTimeSource::new(0));
    let payload = json!({ "subjectId": 1, "message": "hello" });

    for listeners in [1usize, 8, 64] {
        let bus = EventBus::new(config.clone(), clock.clone());
        for _ in 0..listeners {
            bus.register("chat", Listener::infallible(|p| {
                black_box(p);
            }))
            .unwrap();
        }

        group.throughput(Throughput::Elements(listeners as u64));
        group.bench_with_input(BenchmarkId::new("emit", listeners), &bus, |b, bus| {
            b.iter(|| black_box(bus.emit("chat", &payload).unwrap()))
        });
    }
    group.finish();
}

// ============================================================================
// STATE STORE
// ============================================================================

fn bench_store(c: &mut Criterion) {
    let mut group = c.benchmark_group("state-store");
    let clock = Arc::new(ManualTimeSource::new(0));
    let store = StateStore::new(clock.clone());
    for i in 0..1_000 {
        store.set(&format!("key:{i}"), json!(i), None).unwrap();
    }

    group.bench_function("get_hit", |b| {
        b.iter(|| black_box(store.get("key:500")))
    });
    group.bench_function("set_ttl", |b| {
        b.iter(|| {
            store
                .set("hot", json!(1), Some(Duration::from_secs(60)))
                .unwrap()
        })
    });

    group.bench_function("clear_expired_10k", |b| {
        b.iter_batched(
            || {
                let clock = Arc::new(ManualTimeSource::new(0));
                let store = StateStore::new(clock.clone());
                for i in 0..10_000 {
                    store
                        .set(&format!("k{i}"), json!(i), Some(Duration::from_secs(1)))
                        .unwrap();
                }
                clock.advance(2_000);
                store
            },
            |store| black_box(store.clear_expired()),
            criterion::BatchSize::LargeInput,
        )
    });
    group.finish();
}

// ============================================================================
// MODULE LOADER
// ============================================================================

fn bench_resolve_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("module-loader");

    for size in [10usize, 100, 500] {
        // Reverse order so every module is discovered before its dependency.
        let descriptors: Vec<ModuleDescriptor> = (0..size)
            .rev()
            .map(|i| {
                let d = ModuleDescriptor::new(format!("m{i}"), "1.0.0");
                if i == 0 {
                    d
                } else {
                    d.depends_on(format!("m{}", i - 1))
                }
            })
            .collect();

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(
            BenchmarkId::new("resolve_chain", size),
            &descriptors,
            |b, descriptors| b.iter(|| black_box(resolve_order(descriptors, &HashSet::new()))),
        );
    }
    group.finish();
}

criterion_group!(benches, bench_bus_emit, bench_store, bench_resolve_chain);
criterion_main!(benches);
