//! Continuation runtime benchmarks using criterion.
//!
//! Benchmarks for scope setup, control round-trips, nondeterministic
//! fan-out, and parsing throughput.
//!
//! Run with: cargo bench --bench scope_bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use delimit::{list, nondet, parse, reset, Choice, ListScope, Scope};

/// Benchmark a scope with no suspension at all.
fn bench_pure_reset(c: &mut Criterion) {
    c.bench_function("reset/pure", |b| {
        b.iter(|| reset(|_: &Scope<i32>| black_box(42)));
    });
}

/// Benchmark a single control round-trip.
fn bench_control_round_trip(c: &mut Criterion) {
    c.bench_function("reset/control_resume", |b| {
        b.iter(|| {
            reset(|scope: &Scope<i32>| {
                let x: i32 = scope.control(|k| k.resume(black_box(21)));
                x * 2
            })
        });
    });
}

/// Benchmark nondeterministic fan-out at increasing depth.
fn bench_choice_fan_out(c: &mut Criterion) {
    let mut group = c.benchmark_group("nondet/fan_out");
    for depth in [2usize, 4, 6] {
        group.throughput(Throughput::Elements(1 << depth as u64));
        group.bench_with_input(BenchmarkId::from_parameter(depth), &depth, |b, &depth| {
            b.iter(|| {
                let outcomes: Vec<u32> = nondet(move |ch: &Choice<Vec<u32>>| {
                    let mut acc = 0u32;
                    for _ in 0..depth {
                        acc = (acc << 1) | u32::from(ch.choose());
                    }
                    vec![acc]
                });
                black_box(outcomes)
            });
        });
    }
    group.finish();
}

/// Benchmark the list builder's cross product.
fn bench_list_cross_product(c: &mut Criterion) {
    c.bench_function("list/cross_product_4x4", |b| {
        b.iter(|| {
            let out = list(|l: &ListScope<i32>| {
                let a = l.bind(vec![1, 2, 3, 4]);
                let b = l.bind(vec![10, 20, 30, 40]);
                a + b
            });
            black_box(out)
        });
    });
}

/// Benchmark integer-list parsing.
fn bench_parse_integers(c: &mut Criterion) {
    let input: String = (0..64).map(|i| i.to_string()).collect::<Vec<_>>().join(",");
    c.bench_function("parser/int_list_64", |b| {
        b.iter(|| {
            let parsed = parse(input.clone(), |p| {
                let ns = p.sep_by(|c| c.integer(), |c| c.literal(","));
                p.end();
                ns
            });
            black_box(parsed)
        });
    });
}

criterion_group!(
    benches,
    bench_pure_reset,
    bench_control_round_trip,
    bench_choice_fan_out,
    bench_list_cross_product,
    bench_parse_integers
);
criterion_main!(benches);
