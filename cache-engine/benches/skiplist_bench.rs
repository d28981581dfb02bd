//! Skip list and ordered-collection benchmarks
//!
//! Run with `cargo bench --bench skiplist_bench`.

use cache_engine::OrderedCollection;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

fn populated(n: usize) -> OrderedCollection {
    let mut oc = OrderedCollection::new();
    for i in 0..n {
        oc.add(format!("member-{i}"), i as f64);
    }
    oc
}

fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("ordered_collection_insert");
    for size in [100usize, 1_000, 10_000] {
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            b.iter(|| {
                let mut oc = populated(size);
                oc.add("new-member".to_string(), black_box(size as f64 + 1.0));
            });
        });
    }
    group.finish();
}

fn bench_rank(c: &mut Criterion) {
    let mut group = c.benchmark_group("ordered_collection_rank");
    for size in [100usize, 1_000, 10_000] {
        let oc = populated(size);
        let probe = format!("member-{}", size / 2);
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| black_box(oc.rank(&probe)));
        });
    }
    group.finish();
}

fn bench_range_by_score(c: &mut Criterion) {
    let mut group = c.benchmark_group("ordered_collection_range_by_score");
    for size in [100usize, 1_000, 10_000] {
        let oc = populated(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            b.iter(|| black_box(oc.range_by_score(0.0, (size / 10) as f64, usize::MAX)));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_insert, bench_rank, bench_range_by_score);
criterion_main!(benches);
