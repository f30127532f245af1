//! Performance benchmarks for cache-switch
//!
//! This benchmark suite measures:
//! - InMemory backend operations (set, get, exists) across payload sizes
//! - Eviction cost once the in-memory backend is at capacity
//! - File backend set/get
//! - Envelope serialization
//!
//! Run with: cargo bench
//! View results: open target/criterion/report/index.html

use cache_switch::backend::{CacheBackend, FileBackend, InMemoryBackend};
use cache_switch::serialization::{deserialize_from_cache, serialize_for_cache};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::hint::black_box;

const TTL: i64 = 300;

// ============================================================================
// Group 1: InMemory Backend
// ============================================================================

fn inmemory_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("inmemory_backend");
    let rt = tokio::runtime::Runtime::new().expect("Failed to create Tokio runtime");

    for size in [100, 1_000, 10_000].iter() {
        group
            .throughput(Throughput::Bytes(*size as u64))
            .bench_with_input(BenchmarkId::new("set", size), size, |b, &size| {
                let backend = InMemoryBackend::new(1000);
                let value = vec![1u8; size];

                b.to_async(&rt).iter(|| async {
                    backend
                        .set(black_box("test_key"), black_box(value.clone()), TTL)
                        .await
                        .expect("Failed to set")
                });
            });

        group
            .throughput(Throughput::Bytes(*size as u64))
            .bench_with_input(BenchmarkId::new("get_hit", size), size, |b, &size| {
                let backend = InMemoryBackend::new(1000);
                rt.block_on(async {
                    backend
                        .set("test_key", vec![1u8; size], TTL)
                        .await
                        .expect("Failed to set");
                });

                b.to_async(&rt)
                    .iter(|| async { backend.get(black_box("test_key")).await });
            });
    }

    group.bench_function("get_miss", |b| {
        let backend = InMemoryBackend::new(1000);

        b.to_async(&rt)
            .iter(|| async { backend.get(black_box("nonexistent_key")).await });
    });

    group.bench_function("exists", |b| {
        let backend = InMemoryBackend::new(1000);
        rt.block_on(async {
            backend
                .set("test_key", vec![1u8; 100], TTL)
                .await
                .expect("Failed to set");
        });

        b.to_async(&rt)
            .iter(|| async { backend.exists(black_box("test_key")).await });
    });

    group.finish();
}

// ============================================================================
// Group 2: Eviction at capacity
// ============================================================================

fn eviction_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("eviction");
    let rt = tokio::runtime::Runtime::new().expect("Failed to create Tokio runtime");

    for max_size in [100, 1_000, 10_000].iter() {
        group.bench_with_input(
            BenchmarkId::new("set_at_capacity", max_size),
            max_size,
            |b, &max_size| {
                let backend = InMemoryBackend::new(max_size);
                rt.block_on(async {
                    for i in 0..max_size {
                        backend
                            .set(&format!("warm:{}", i), vec![0u8; 16], TTL)
                            .await
                            .expect("Failed to set");
                    }
                });

                let mut counter = 0u64;
                b.to_async(&rt).iter(|| {
                    counter += 1;
                    let key = format!("new:{}", counter);
                    let backend = &backend;
                    async move {
                        backend
                            .set(black_box(&key), vec![0u8; 16], TTL)
                            .await
                            .expect("Failed to set")
                    }
                });
            },
        );
    }

    group.finish();
}

// ============================================================================
// Group 3: File Backend
// ============================================================================

fn file_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("file_backend");
    let rt = tokio::runtime::Runtime::new().expect("Failed to create Tokio runtime");
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let backend = rt
        .block_on(FileBackend::new(dir.path()))
        .expect("Failed to create file backend");

    group.bench_function("set_1k", |b| {
        let value = vec![1u8; 1_000];
        b.to_async(&rt).iter(|| async {
            backend
                .set(black_box("bench_key"), value.clone(), TTL)
                .await
                .expect("Failed to set")
        });
    });

    group.bench_function("get_hit_1k", |b| {
        rt.block_on(async {
            backend
                .set("bench_hit", vec![1u8; 1_000], TTL)
                .await
                .expect("Failed to set");
        });

        b.to_async(&rt)
            .iter(|| async { backend.get(black_box("bench_hit")).await });
    });

    group.finish();
}

// ============================================================================
// Group 4: Serialization
// ============================================================================

fn serialization_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("serialization");

    for size in [100, 1_000, 10_000].iter() {
        let payload = vec![7u8; *size];

        group
            .throughput(Throughput::Bytes(*size as u64))
            .bench_with_input(BenchmarkId::new("serialize", size), &payload, |b, payload| {
                b.iter(|| serialize_for_cache(black_box(payload)));
            });

        let serialized = serialize_for_cache(&payload).expect("Failed to serialize");
        group
            .throughput(Throughput::Bytes(*size as u64))
            .bench_with_input(
                BenchmarkId::new("deserialize", size),
                &serialized,
                |b, serialized| {
                    b.iter(|| deserialize_from_cache::<Vec<u8>>(black_box(serialized)));
                },
            );
    }

    group.finish();
}

// ============================================================================
// Benchmark Registration
// ============================================================================

criterion_group!(
    benches,
    inmemory_benchmarks,
    eviction_benchmarks,
    file_benchmarks,
    serialization_benchmarks
);
criterion_main!(benches);
