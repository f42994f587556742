//! Benchmarks for the route optimizer.
//!
//! Run with: cargo bench --bench route_optimizer

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use marga::{optimize, Route};

/// Route with `detours` dead-end excursions between straight passes, the
/// shape a left-hand exploration of a comb-like maze records.
fn comb_route(detours: usize) -> Route {
    let mut text = String::with_capacity(detours * 4 + 1);
    for i in 0..detours {
        text.push_str(if i % 2 == 0 { "LTL" } else { "STR" });
        text.push('S');
    }
    text.push('F');
    text.parse().unwrap()
}

/// Nested dead ends: every collapse exposes the next turn-around
fn nested_route(depth: usize) -> Route {
    let mut text = String::with_capacity(depth * 2 + 2);
    text.extend(std::iter::repeat('L').take(depth));
    text.push('T');
    text.extend(std::iter::repeat('R').take(depth));
    text.push('F');
    text.parse().unwrap()
}

fn bench_optimize(c: &mut Criterion) {
    let mut group = c.benchmark_group("optimize");

    for detours in [4, 12, 24] {
        let route = comb_route(detours);
        group.throughput(Throughput::Elements(route.len() as u64));
        group.bench_with_input(BenchmarkId::new("comb", route.len()), &route, |b, route| {
            b.iter(|| optimize(black_box(route)))
        });
    }

    for depth in [8, 32, 48] {
        let route = nested_route(depth);
        group.throughput(Throughput::Elements(route.len() as u64));
        group.bench_with_input(BenchmarkId::new("nested", route.len()), &route, |b, route| {
            b.iter(|| optimize(black_box(route)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_optimize);
criterion_main!(benches);
