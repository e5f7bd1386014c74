//! Driven Ports (SPI - Outbound)
//!
//! Collaborators the converter depends on. The store owns durable I/O; the
//! message lookup and transaction list are the broker's in-memory state.

use crate::domain::{
    PacketReference, RemoteTransactionAckEntry, TransactionBroker, TransactionInformation,
    TxnLogRecord,
};
use crate::error::TxnLogResult;
use async_trait::async_trait;
use mq_01_destination::DestinationUid;
use shared_types::{ConsumerUid, SysMessageId, TransactionUid};
use std::collections::HashMap;

/// Durable store with a transaction log.
///
/// Writes for one transaction id are serialized by the caller.
#[async_trait]
pub trait TxnLogStore: Send + Sync {
    /// Append a record to the transaction log.
    async fn log_txn(&self, record: &TxnLogRecord) -> TxnLogResult<()>;

    /// Remove a stored message from a destination.
    ///
    /// With `best_effort` a missing message is not an error; I/O failures
    /// still are.
    async fn remove_message(
        &self,
        destination: &DestinationUid,
        message_id: &SysMessageId,
        best_effort: bool,
    ) -> TxnLogResult<()>;

    /// Consumers a stored message is routed to.
    async fn consumer_uids_for(
        &self,
        destination: &DestinationUid,
        message_id: &SysMessageId,
    ) -> TxnLogResult<Vec<ConsumerUid>>;
}

/// Lookup of live messages by id.
pub trait MessageLookup: Send + Sync {
    /// `None` when the message is no longer held by the broker.
    fn get(&self, message_id: &SysMessageId) -> Option<PacketReference>;
}

/// The broker's transaction list.
pub trait TransactionList: Send + Sync {
    /// Local and cluster transactions.
    fn transactions(&self) -> Vec<TransactionInformation>;

    /// Remote transactions.
    fn remote_transactions(&self) -> Vec<TransactionInformation>;

    /// Messages published under `tid`, in publish order.
    fn published_messages(&self, tid: TransactionUid) -> Vec<SysMessageId>;

    /// Messages consumed under `tid` with the consumers that acknowledged
    /// them, in consumption order.
    fn consumed_messages(&self, tid: TransactionUid) -> Vec<(SysMessageId, Vec<ConsumerUid>)>;

    /// Transient consumer id to persisted consumer id.
    fn stored_consumer_uids(&self, tid: TransactionUid) -> HashMap<ConsumerUid, ConsumerUid>;

    /// Acknowledgment entries recovered for a remote transaction.
    fn recovery_remote_acks(&self, tid: TransactionUid) -> Option<Vec<RemoteTransactionAckEntry>>;

    /// Coordinating broker of a remote transaction.
    fn remote_transaction_home_broker(&self, tid: TransactionUid) -> Option<TransactionBroker>;
}
