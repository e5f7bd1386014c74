//! Broker status and lifecycle state for members of a cluster.
//!
//! Status is two capability flags, validated together:
//!
//! | up | link up | Meaning |
//! |----|---------|---------|
//! | no | no | broker down |
//! | yes | no | broker running, cluster link not established |
//! | yes | yes | broker running and linked |
//!
//! A link cannot be up on a broker that is down. Status changes drive the
//! lifecycle state: up forces `Operating`, down forces `ShutdownComplete`.
//!
//! State Machine:
//! ```text
//! [INITIALIZING] ──→ [OPERATING] ──→ [QUIESCE_STARTED] ──→ [QUIESCE_COMPLETED]
//!                        │  ↑                                      │
//!                        │  └──────────────────────────────────────┘
//!                        ├──→ [FAILOVER_PENDING] ──→ [FAILOVER_STARTED] ──→ [FAILOVER_COMPLETE | FAILOVER_FAILED]
//!                        └──→ [SHUTDOWN_STARTED] ──→ [SHUTDOWN_FAILOVER] ──→ [SHUTDOWN_COMPLETE]
//! ```

use crate::error::{ClusterSyncError, ClusterSyncResult};
use serde::{Deserialize, Serialize};
use shared_types::BrokerAddress;
use std::fmt;
use tracing::{debug, info};

/// Lifecycle state of a broker.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum BrokerState {
    #[default]
    Initializing,
    Operating,
    QuiesceStarted,
    QuiesceCompleted,
    FailoverPending,
    FailoverStarted,
    FailoverComplete,
    FailoverFailed,
    ShutdownStarted,
    ShutdownFailover,
    ShutdownComplete,
}

impl BrokerState {
    /// Whether `self -> next` is an allowed explicit transition.
    pub fn can_transition_to(self, next: BrokerState) -> bool {
        use BrokerState::*;
        if self == next {
            return true;
        }
        match self {
            Initializing => matches!(next, Operating | ShutdownStarted | ShutdownComplete),
            Operating => matches!(
                next,
                QuiesceStarted | FailoverPending | ShutdownStarted | ShutdownComplete
            ),
            QuiesceStarted => matches!(next, QuiesceCompleted | Operating | ShutdownStarted),
            QuiesceCompleted => matches!(next, Operating | ShutdownStarted),
            FailoverPending => matches!(next, FailoverStarted | Operating),
            FailoverStarted => matches!(next, FailoverComplete | FailoverFailed),
            FailoverComplete => matches!(next, ShutdownComplete | Operating),
            FailoverFailed => matches!(next, FailoverPending | Operating),
            ShutdownStarted => matches!(next, ShutdownFailover | ShutdownComplete),
            ShutdownFailover => matches!(next, ShutdownComplete),
            ShutdownComplete => matches!(next, Initializing | Operating),
        }
    }

    pub fn is_active(self) -> bool {
        matches!(
            self,
            BrokerState::Operating | BrokerState::QuiesceStarted | BrokerState::QuiesceCompleted
        )
    }
}

impl fmt::Display for BrokerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BrokerState::Initializing => "INITIALIZING",
            BrokerState::Operating => "OPERATING",
            BrokerState::QuiesceStarted => "QUIESCE_STARTED",
            BrokerState::QuiesceCompleted => "QUIESCE_COMPLETED",
            BrokerState::FailoverPending => "FAILOVER_PENDING",
            BrokerState::FailoverStarted => "FAILOVER_STARTED",
            BrokerState::FailoverComplete => "FAILOVER_COMPLETE",
            BrokerState::FailoverFailed => "FAILOVER_FAILED",
            BrokerState::ShutdownStarted => "SHUTDOWN_STARTED",
            BrokerState::ShutdownFailover => "SHUTDOWN_FAILOVER",
            BrokerState::ShutdownComplete => "SHUTDOWN_COMPLETE",
        };
        f.write_str(name)
    }
}

/// Up/link-up capability flags of a broker.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct BrokerStatus {
    up: bool,
    link_up: bool,
}

impl BrokerStatus {
    pub const DOWN: BrokerStatus = BrokerStatus {
        up: false,
        link_up: false,
    };
    pub const UP: BrokerStatus = BrokerStatus {
        up: true,
        link_up: false,
    };
    pub const LINKED: BrokerStatus = BrokerStatus {
        up: true,
        link_up: true,
    };

    pub fn new(up: bool, link_up: bool) -> ClusterSyncResult<Self> {
        if link_up && !up {
            return Err(ClusterSyncError::InvalidStatus);
        }
        Ok(Self { up, link_up })
    }

    pub fn is_up(self) -> bool {
        self.up
    }

    pub fn is_link_up(self) -> bool {
        self.link_up
    }
}

/// A status change, reported so callers can notify cluster listeners.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StatusChange {
    pub old: BrokerStatus,
    pub new: BrokerStatus,
    pub state: BrokerState,
}

/// A member of the cluster as seen from this broker.
#[derive(Debug, Clone)]
pub struct ClusteredBroker {
    address: BrokerAddress,
    session: u64,
    status: BrokerStatus,
    state: BrokerState,
}

impl ClusteredBroker {
    pub fn new(address: BrokerAddress, session: u64) -> Self {
        Self {
            address,
            session,
            status: BrokerStatus::DOWN,
            state: BrokerState::Initializing,
        }
    }

    pub fn address(&self) -> &BrokerAddress {
        &self.address
    }

    pub fn session(&self) -> u64 {
        self.session
    }

    pub fn status(&self) -> BrokerStatus {
        self.status
    }

    pub fn state(&self) -> BrokerState {
        self.state
    }

    /// Explicit lifecycle transition, validated.
    pub fn set_state(&mut self, next: BrokerState) -> ClusterSyncResult<()> {
        if !self.state.can_transition_to(next) {
            return Err(ClusterSyncError::InvalidStateTransition {
                from: self.state,
                to: next,
            });
        }
        debug!(broker = %self.address, from = %self.state, to = %next, "[mq-03] broker state changed");
        self.state = next;
        Ok(())
    }

    /// A new broker session replaces the old one after a restart.
    pub fn set_session(&mut self, session: u64) {
        self.session = session;
    }

    /// Set the up flag for a broker session.
    ///
    /// A down report for a session other than the current one is stale and
    /// ignored. Going down also takes the link down.
    pub fn set_broker_is_up(&mut self, up: bool, session: u64) -> Option<StatusChange> {
        if !up && session != self.session {
            info!(
                broker = %self.address,
                session,
                current = self.session,
                "[mq-03] ignoring down status for stale broker session"
            );
            return None;
        }
        let status = if up {
            BrokerStatus {
                up: true,
                link_up: self.status.link_up,
            }
        } else {
            BrokerStatus::DOWN
        };
        self.apply(status)
    }

    /// Set the link flag. Link up implies up, link down implies down.
    pub fn set_broker_link_up(&mut self, up: bool) -> Option<StatusChange> {
        let status = if up {
            BrokerStatus::LINKED
        } else {
            BrokerStatus::DOWN
        };
        self.apply(status)
    }

    fn apply(&mut self, status: BrokerStatus) -> Option<StatusChange> {
        if status == self.status {
            return None;
        }
        let old = self.status;
        self.status = status;
        // status drives the state directly, whatever the current state
        self.state = if status.up {
            BrokerState::Operating
        } else {
            BrokerState::ShutdownComplete
        };
        debug!(broker = %self.address, up = status.up, link_up = status.link_up, "[mq-03] broker status changed");
        Some(StatusChange {
            old,
            new: status,
            state: self.state,
        })
    }
}
