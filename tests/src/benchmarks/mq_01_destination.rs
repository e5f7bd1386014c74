//! # MQ-01 Destination Benchmarks
//!
//! Hot paths on every publish to a topic hierarchy:
//! - compiling a wildcard subscription
//! - matching a concrete topic against a compiled wildcard
//! - interning a destination name through the registry
//!
//! Names are random dotted paths so deep (`**`) patterns have to
//! backtrack.

use criterion::{black_box, BenchmarkId, Criterion, Throughput};
use mq_01_destination::{DestinationRegistry, DestinationResolver, DestinationUid, WildcardPattern};
use rand::Rng;
use std::time::Duration;

const SEGMENTS: [&str; 6] = ["prices", "orders", "eu", "us", "fx", "equity"];

fn random_topic(rng: &mut impl Rng, depth: usize) -> String {
    (0..depth)
        .map(|_| SEGMENTS[rng.gen_range(0..SEGMENTS.len())])
        .collect::<Vec<_>>()
        .join(".")
}

pub fn bench_wildcard_compile(c: &mut Criterion) {
    let mut group = c.benchmark_group("mq-01/wildcard/compile");
    group.measurement_time(Duration::from_secs(5));

    for pattern in ["prices.*", "prices.>", "prices.**.eu", "**.fx.*"] {
        group.bench_with_input(BenchmarkId::from_parameter(pattern), &pattern, |b, p| {
            b.iter(|| black_box(WildcardPattern::compile(p)))
        });
    }

    group.finish();
}

pub fn bench_wildcard_match(c: &mut Criterion) {
    let mut group = c.benchmark_group("mq-01/wildcard/match");
    group.measurement_time(Duration::from_secs(5));

    let mut rng = rand::thread_rng();
    let deep = DestinationUid::topic("prices.**.eu").ok();
    let Some(deep) = deep else {
        return;
    };

    for depth in [2, 4, 8, 16] {
        let topics: Vec<DestinationUid> = (0..256)
            .filter_map(|_| DestinationUid::topic(&random_topic(&mut rng, depth)).ok())
            .collect();

        group.throughput(Throughput::Elements(topics.len() as u64));
        group.bench_with_input(BenchmarkId::new("deep", depth), &topics, |b, topics| {
            b.iter(|| topics.iter().filter(|t| deep.matches(t).unwrap_or(false)).count())
        });
    }

    group.finish();
}

pub fn bench_registry_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("mq-01/registry");
    group.measurement_time(Duration::from_secs(5));

    let registry = DestinationRegistry::new();
    let mut rng = rand::thread_rng();
    let names: Vec<String> = (0..1024).map(|_| random_topic(&mut rng, 4)).collect();
    // keep entries alive so lookups hit
    let held: Vec<DestinationUid> = names
        .iter()
        .filter_map(|n| registry.get_uid(n, false).ok())
        .collect();

    group.throughput(Throughput::Elements(names.len() as u64));
    group.bench_function("get_uid_hit", |b| {
        b.iter(|| {
            names
                .iter()
                .filter_map(|n| registry.get_uid(n, false).ok())
                .count()
        })
    });
    black_box(held.len());

    group.finish();
}

pub fn register_benchmarks(c: &mut Criterion) {
    bench_wildcard_compile(c);
    bench_wildcard_match(c);
    bench_registry_lookup(c);
}
