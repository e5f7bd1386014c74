//! # Broker Core Test Suite
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── benchmarks/     # Hot-path benchmarks per subsystem
//! │   └── mq_01_destination.rs
//! │
//! └── integration/    # Cross-subsystem flows
//!     ├── txn_log.rs
//!     └── cluster_sync.rs
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p mq-tests
//! cargo test -p mq-tests integration::cluster_sync
//! cargo bench -p mq-tests
//! ```

pub mod benchmarks;
pub mod integration;
