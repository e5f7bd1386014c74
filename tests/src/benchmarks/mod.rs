//! # Broker Core Benchmarks

pub mod mq_01_destination;
