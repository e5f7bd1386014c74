//! # mq-03-cluster-sync
//!
//! What a broker does while it is still catching up with the cluster's
//! master broker.
//!
//! ## Overview
//!
//! | Component | Role |
//! |-----------|------|
//! | `RestrictionGate` | decides whether an inbound packet must wait |
//! | `MasterBrokerWaiter` | parks waiting packets and answers them later |
//! | `ClusteredBroker` | up/link-up status and lifecycle state of a peer |
//!
//! ## Architecture
//!
//! ```text
//! inbound packet ──→ RestrictionGate ──Proceed──→ normal handling
//!                          │
//!                          └──Waiting──→ MasterBrokerWaiter ──Retry / Unavailable──→ ErrorReporter
//!                                             ↑        ↑
//!                        restriction changed ─┘        └─ connection closed
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use mq_03_cluster_sync::{GateConfig, MasterBrokerWaiter, RestrictionGate, WaiterConfig};
//!
//! let waiter = Arc::new(MasterBrokerWaiter::new(WaiterConfig::from_env(), reporter, Handle::current()));
//! let gate = RestrictionGate::new(GateConfig::from_env(), registry, directory, waiter.clone());
//! match gate.check(&request, connection)? {
//!     GateDecision::Proceed => handle(request),
//!     GateDecision::Waiting { .. } => {}
//! }
//! ```

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod adapters;
pub mod config;
pub mod domain;
pub mod error;
pub mod gate;
pub mod metrics;
pub mod ports;
pub mod service;

pub use config::{GateConfig, MaxWait, WaiterConfig, DEFAULT_MAX_WAIT_SECS, DEFAULT_WAIT_INTERVAL};
pub use domain::{
    is_restrictable, BrokerState, BrokerStatus, ClusteredBroker, DestType, InboundRequest,
    ServiceRestriction, ServiceType, StatusChange,
};
pub use error::{ClusterSyncError, ClusterSyncResult};
pub use gate::{GateDecision, RestrictionGate};
pub use ports::{
    BrokerService, ClientConnection, ConnectionClosedListener, DestinationDirectory,
    ErrorReporter, RestrictionListener, SyncWaiter,
};
pub use service::{resolve, MasterBrokerWaiter, Resolution, WaitRequest};
