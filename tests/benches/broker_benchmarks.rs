//! # Broker Core Benchmarks
//!
//! | Subsystem | Hot path |
//! |-----------|----------|
//! | mq-01 Destination | wildcard compile, wildcard match, registry lookup |

use criterion::{criterion_group, criterion_main, Criterion};

fn destination_benchmarks(c: &mut Criterion) {
    mq_tests::benchmarks::mq_01_destination::register_benchmarks(c);
}

criterion_group!(benches, destination_benchmarks);
criterion_main!(benches);
