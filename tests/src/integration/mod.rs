//! # Integration Flows
//!
//! | Module | Subsystems |
//! |--------|------------|
//! | `txn_log` | mq-01 destinations interned by the registry, converted by mq-02 |
//! | `cluster_sync` | mq-03 gate and waiter over mq-01 resolution, with telemetry |

pub mod cluster_sync;
pub mod txn_log;
