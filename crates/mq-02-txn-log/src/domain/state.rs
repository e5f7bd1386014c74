//! Transaction lifecycle states and transaction kinds.

use serde::{Deserialize, Serialize};
use shared_types::{BrokerAddress, TransactionUid, Xid};
use std::fmt;

/// Lifecycle state of a transaction.
///
/// Codes are the values persisted in transaction records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionState {
    Created,
    Started,
    Failed,
    Incomplete,
    Complete,
    /// First phase of two-phase commit done; recoverable but not final.
    Prepared,
    Committed,
    RolledBack,
    TimedOut,
}

impl TransactionState {
    pub fn code(self) -> i32 {
        match self {
            TransactionState::Created => 0,
            TransactionState::Started => 1,
            TransactionState::Failed => 2,
            TransactionState::Incomplete => 3,
            TransactionState::Complete => 4,
            TransactionState::Prepared => 5,
            TransactionState::Committed => 6,
            TransactionState::RolledBack => 7,
            TransactionState::TimedOut => 8,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        let state = match code {
            0 => TransactionState::Created,
            1 => TransactionState::Started,
            2 => TransactionState::Failed,
            3 => TransactionState::Incomplete,
            4 => TransactionState::Complete,
            5 => TransactionState::Prepared,
            6 => TransactionState::Committed,
            7 => TransactionState::RolledBack,
            8 => TransactionState::TimedOut,
            _ => return None,
        };
        Some(state)
    }

    pub fn is_prepared(self) -> bool {
        self == TransactionState::Prepared
    }
}

impl fmt::Display for TransactionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransactionState::Created => "CREATED",
            TransactionState::Started => "STARTED",
            TransactionState::Failed => "FAILED",
            TransactionState::Incomplete => "INCOMPLETE",
            TransactionState::Complete => "COMPLETE",
            TransactionState::Prepared => "PREPARED",
            TransactionState::Committed => "COMMITTED",
            TransactionState::RolledBack => "ROLLEDBACK",
            TransactionState::TimedOut => "TIMED_OUT",
        };
        f.write_str(name)
    }
}

/// A broker taking part in a cluster transaction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransactionBroker {
    pub address: BrokerAddress,
    /// The broker has acknowledged the transaction outcome.
    pub completed: bool,
}

impl TransactionBroker {
    pub fn new(address: BrokerAddress) -> Self {
        Self {
            address,
            completed: false,
        }
    }
}

/// Where a transaction lives relative to this broker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionKind {
    /// Entirely on this broker.
    Local,
    /// Spans several brokers, coordinated from here.
    Cluster { brokers: Vec<TransactionBroker> },
    /// Coordinated by another broker; this broker holds its acknowledgments.
    Remote,
}

impl TransactionKind {
    /// Label used in logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            TransactionKind::Local => "local",
            TransactionKind::Cluster { .. } => "cluster",
            TransactionKind::Remote => "remote",
        }
    }
}

/// Broker's in-memory view of one transaction.
#[derive(Debug, Clone)]
pub struct TransactionInformation {
    pub tid: TransactionUid,
    pub state: TransactionState,
    pub xid: Option<Xid>,
    pub kind: TransactionKind,
}

impl TransactionInformation {
    pub fn local(tid: TransactionUid, state: TransactionState) -> Self {
        Self {
            tid,
            state,
            xid: None,
            kind: TransactionKind::Local,
        }
    }

    pub fn cluster(
        tid: TransactionUid,
        state: TransactionState,
        brokers: Vec<TransactionBroker>,
    ) -> Self {
        Self {
            tid,
            state,
            xid: None,
            kind: TransactionKind::Cluster { brokers },
        }
    }

    pub fn remote(tid: TransactionUid, state: TransactionState) -> Self {
        Self {
            tid,
            state,
            xid: None,
            kind: TransactionKind::Remote,
        }
    }

    pub fn with_xid(mut self, xid: Xid) -> Self {
        self.xid = Some(xid);
        self
    }
}

impl fmt::Display for TransactionInformation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{} txn {} {}", self.kind.label(), self.tid, self.state)?;
        if let Some(xid) = &self.xid {
            write!(f, " xid={}", xid)?;
        }
        write!(f, "]")
    }
}
