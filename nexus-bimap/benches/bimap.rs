//! Benchmarks for nexus-bimap against a pair of std maps kept in sync by
//! hand.
//!
//! Run with: cargo bench

use std::collections::{BTreeMap, HashMap};

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use nexus_bimap::{BiMap, SideConfig};

const SIZE: usize = 10_000;

/// Spreads sequential ids so ordered inserts are not all appends.
fn scramble(i: u64) -> u64 {
    i.wrapping_mul(0x9e37_79b9_7f4a_7c15).rotate_left(29)
}

fn filled(left: SideConfig<u64>, right: SideConfig<u64>) -> BiMap<u64, u64> {
    let mut map = BiMap::builder(left, right).capacity(SIZE).build();
    for i in 0..SIZE as u64 {
        map.insert(scramble(i), i).unwrap();
    }
    map
}

// ============================================================================
// Insert
// ============================================================================

fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert");
    group.throughput(Throughput::Elements(SIZE as u64));

    let kinds: [(&str, fn() -> SideConfig<u64>); 3] = [
        ("ordered", SideConfig::unique_ordered),
        ("hashed", SideConfig::unique_hashed),
        ("sequenced", SideConfig::sequenced),
    ];

    for (name, config) in kinds {
        group.bench_with_input(BenchmarkId::new("nexus-bimap", name), &config, |b, config| {
            let mut map: BiMap<u64, u64> = BiMap::builder(SideConfig::unique_hashed(), config())
                .capacity(SIZE)
                .build();
            b.iter(|| {
                for i in 0..SIZE as u64 {
                    black_box(map.insert(scramble(i), i).unwrap());
                }
                map.clear();
            });
        });
    }

    group.bench_function("btree-pair", |b| {
        let mut by_left = BTreeMap::new();
        let mut by_right = BTreeMap::new();
        b.iter(|| {
            for i in 0..SIZE as u64 {
                by_left.insert(scramble(i), i);
                by_right.insert(i, scramble(i));
            }
            by_left.clear();
            by_right.clear();
        });
    });

    group.finish();
}

// ============================================================================
// Lookup
// ============================================================================

fn bench_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("lookup");
    group.throughput(Throughput::Elements(SIZE as u64));

    let ordered = filled(SideConfig::unique_ordered(), SideConfig::unique_hashed());
    group.bench_function("nexus-bimap/ordered", |b| {
        b.iter(|| {
            for i in 0..SIZE as u64 {
                black_box(ordered.left().get(&scramble(i)));
            }
        });
    });

    group.bench_function("nexus-bimap/hashed", |b| {
        b.iter(|| {
            for i in 0..SIZE as u64 {
                black_box(ordered.right().get(&i));
            }
        });
    });

    let by_right: HashMap<u64, u64> = (0..SIZE as u64).map(|i| (i, scramble(i))).collect();
    group.bench_function("std-hashmap", |b| {
        b.iter(|| {
            for i in 0..SIZE as u64 {
                black_box(by_right.get(&i));
            }
        });
    });

    group.finish();
}

// ============================================================================
// Churn: erase through one side, reinsert
// ============================================================================

fn bench_churn(c: &mut Criterion) {
    let mut group = c.benchmark_group("churn");
    group.throughput(Throughput::Elements(SIZE as u64));

    let mut map = filled(SideConfig::unique_ordered(), SideConfig::multi_ordered());
    group.bench_function("nexus-bimap/erase-reinsert", |b| {
        b.iter(|| {
            for i in 0..SIZE as u64 {
                let key = scramble(i);
                black_box(map.left_mut().remove(&key));
                map.insert(key, i).unwrap();
            }
        });
    });

    let mut map = filled(SideConfig::unique_ordered(), SideConfig::multi_ordered());
    group.bench_function("nexus-bimap/rebind", |b| {
        let handles: Vec<_> = map.iter().map(|(handle, _)| handle).collect();
        b.iter(|| {
            for (i, &handle) in handles.iter().enumerate() {
                black_box(map.rebind_right(handle, (i % 64) as u64).unwrap());
            }
        });
    });

    group.finish();
}

// ============================================================================
// Iteration
// ============================================================================

fn bench_iterate(c: &mut Criterion) {
    let mut group = c.benchmark_group("iterate");
    group.throughput(Throughput::Elements(SIZE as u64));

    let map = filled(SideConfig::unique_ordered(), SideConfig::multi_hashed());
    group.bench_function("nexus-bimap/left", |b| {
        b.iter(|| map.left().iter().map(|e| *e.value()).fold(0u64, u64::wrapping_add));
    });
    group.bench_function("nexus-bimap/right", |b| {
        b.iter(|| map.right().iter().map(|e| *e.value()).fold(0u64, u64::wrapping_add));
    });
    group.bench_function("nexus-bimap/relations", |b| {
        b.iter(|| map.iter().map(|(_, r)| *r.right()).fold(0u64, u64::wrapping_add));
    });

    group.finish();
}

criterion_group!(benches, bench_insert, bench_lookup, bench_churn, bench_iterate);

criterion_main!(benches);
