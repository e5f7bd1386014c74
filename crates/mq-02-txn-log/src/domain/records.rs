//! Durable transaction log records.
//!
//! A record is what the store appends to its transaction log when a
//! transaction is prepared. Recovery replays these records; the physical
//! encoding belongs to the store.

use super::state::{TransactionBroker, TransactionState};
use super::work::TransactionWork;
use mq_01_destination::DestinationUid;
use serde::{Deserialize, Serialize};
use shared_types::{BrokerAddress, ConsumerUid, SysMessageId, TransactionUid, Xid};

/// One message acknowledged under a remote transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionAcknowledgement {
    pub message_id: SysMessageId,
    pub consumer: ConsumerUid,
    pub stored_consumer: ConsumerUid,
}

/// Acknowledgments recovered for a remote transaction, as handed over by
/// the home broker. A transaction may have several entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteTransactionAckEntry {
    pub acks: Vec<TransactionAcknowledgement>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalTransaction {
    pub tid: TransactionUid,
    pub state: TransactionState,
    pub xid: Option<Xid>,
    pub work: TransactionWork,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterTransaction {
    pub tid: TransactionUid,
    pub state: TransactionState,
    pub xid: Option<Xid>,
    pub work: TransactionWork,
    pub brokers: Vec<TransactionBroker>,
}

/// A transaction coordinated elsewhere.
///
/// `destinations[i]` is the destination of `acks[i]`, or `None` when the
/// acknowledged message could no longer be found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteTransaction {
    pub tid: TransactionUid,
    pub state: TransactionState,
    pub acks: Vec<TransactionAcknowledgement>,
    pub destinations: Vec<Option<DestinationUid>>,
    pub home_broker: BrokerAddress,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TxnLogRecord {
    Local(LocalTransaction),
    Cluster(ClusterTransaction),
    Remote(RemoteTransaction),
}

impl TxnLogRecord {
    pub fn tid(&self) -> TransactionUid {
        match self {
            TxnLogRecord::Local(t) => t.tid,
            TxnLogRecord::Cluster(t) => t.tid,
            TxnLogRecord::Remote(t) => t.tid,
        }
    }

    pub fn state(&self) -> TransactionState {
        match self {
            TxnLogRecord::Local(t) => t.state,
            TxnLogRecord::Cluster(t) => t.state,
            TxnLogRecord::Remote(t) => t.state,
        }
    }

    /// Work payload; remote records carry acknowledgments instead.
    pub fn work(&self) -> Option<&TransactionWork> {
        match self {
            TxnLogRecord::Local(t) => Some(&t.work),
            TxnLogRecord::Cluster(t) => Some(&t.work),
            TxnLogRecord::Remote(_) => None,
        }
    }

    pub fn kind_label(&self) -> &'static str {
        match self {
            TxnLogRecord::Local(_) => "local",
            TxnLogRecord::Cluster(_) => "cluster",
            TxnLogRecord::Remote(_) => "remote",
        }
    }
}
