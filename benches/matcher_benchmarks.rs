use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use topica::{match_topic, validate_topic};

fn bench_validate(c: &mut Criterion) {
    let long = "x".repeat(256);
    let mut group = c.benchmark_group("validate_topic");
    for topic in ["a.b.c", "svc/orders-eu.created.v2", long.as_str()] {
        group.bench_with_input(BenchmarkId::from_parameter(topic.len()), topic, |b, t| {
            b.iter(|| validate_topic(black_box(t)))
        });
    }
    group.finish();
}

fn bench_match(c: &mut Criterion) {
    let cases = [
        ("exact", "a.b.c", "a.b.c"),
        ("wildcard", "a.b.c", "*.*.c"),
        ("count_mismatch", "a.b.c.d", "a.b.c"),
        ("early_miss", "orders.eu.created", "users.*.created"),
        ("deep", "a/b/c/d/e/f/g/h", "a/*/c/*/e/*/g/*"),
    ];

    let mut group = c.benchmark_group("match_topic");
    for (name, topic, pattern) in cases {
        group.bench_function(name, |b| {
            b.iter(|| match_topic(black_box(topic), black_box(pattern)))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_validate, bench_match);
criterion_main!(benches);
