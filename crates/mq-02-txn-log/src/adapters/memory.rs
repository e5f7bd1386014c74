//! In-memory adapters for the outbound ports.
//!
//! The store encodes every logged record with bincode so that what tests
//! read back is what a durable append would have produced.

use crate::domain::{
    PacketReference, RemoteTransactionAckEntry, TransactionBroker, TransactionInformation,
    TransactionKind, TxnLogRecord,
};
use crate::error::{TxnLogError, TxnLogResult};
use crate::ports::outbound::{MessageLookup, TransactionList, TxnLogStore};
use async_trait::async_trait;
use mq_01_destination::DestinationUid;
use parking_lot::RwLock;
use shared_types::{ConsumerUid, SysMessageId, TransactionUid};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};

/// In-memory transaction log store.
#[derive(Default)]
pub struct InMemoryTxnLogStore {
    log: RwLock<Vec<Vec<u8>>>,
    interests: RwLock<HashMap<(DestinationUid, SysMessageId), Vec<ConsumerUid>>>,
    removed: RwLock<Vec<(DestinationUid, SysMessageId)>>,
    fail_writes: AtomicBool,
    fail_removals: AtomicBool,
}

impl InMemoryTxnLogStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Route a stored message to consumers.
    pub fn set_interests(
        &self,
        destination: DestinationUid,
        message_id: SysMessageId,
        consumers: Vec<ConsumerUid>,
    ) {
        self.interests
            .write()
            .insert((destination, message_id), consumers);
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_removals(&self, fail: bool) {
        self.fail_removals.store(fail, Ordering::SeqCst);
    }

    /// Decode every logged record, oldest first.
    pub fn records(&self) -> TxnLogResult<Vec<TxnLogRecord>> {
        self.log
            .read()
            .iter()
            .map(|bytes| bincode::deserialize(bytes).map_err(TxnLogError::from))
            .collect()
    }

    pub fn record_count(&self) -> usize {
        self.log.read().len()
    }

    /// Removal calls that succeeded, in call order.
    pub fn removed(&self) -> Vec<(DestinationUid, SysMessageId)> {
        self.removed.read().clone()
    }
}

#[async_trait]
impl TxnLogStore for InMemoryTxnLogStore {
    async fn log_txn(&self, record: &TxnLogRecord) -> TxnLogResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(TxnLogError::StoreWrite {
                tid: record.tid(),
                reason: "store is read-only".into(),
            });
        }
        let bytes = bincode::serialize(record)?;
        self.log.write().push(bytes);
        Ok(())
    }

    async fn remove_message(
        &self,
        destination: &DestinationUid,
        message_id: &SysMessageId,
        best_effort: bool,
    ) -> TxnLogResult<()> {
        if self.fail_removals.load(Ordering::SeqCst) {
            return Err(TxnLogError::StoreIo(format!(
                "could not remove {} from {}",
                message_id, destination
            )));
        }
        let known = self
            .interests
            .read()
            .contains_key(&(destination.clone(), *message_id));
        if !known && !best_effort {
            return Err(TxnLogError::StoreIo(format!(
                "message {} not found in {}",
                message_id, destination
            )));
        }
        self.removed.write().push((destination.clone(), *message_id));
        Ok(())
    }

    async fn consumer_uids_for(
        &self,
        destination: &DestinationUid,
        message_id: &SysMessageId,
    ) -> TxnLogResult<Vec<ConsumerUid>> {
        Ok(self
            .interests
            .read()
            .get(&(destination.clone(), *message_id))
            .cloned()
            .unwrap_or_default())
    }
}

/// In-memory message lookup.
#[derive(Default)]
pub struct InMemoryMessageLookup {
    messages: RwLock<HashMap<SysMessageId, PacketReference>>,
}

impl InMemoryMessageLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, packet: PacketReference) {
        self.messages.write().insert(packet.message_id, packet);
    }

    pub fn remove(&self, message_id: &SysMessageId) -> Option<PacketReference> {
        self.messages.write().remove(message_id)
    }
}

impl MessageLookup for InMemoryMessageLookup {
    fn get(&self, message_id: &SysMessageId) -> Option<PacketReference> {
        self.messages.read().get(message_id).cloned()
    }
}

struct TxnEntry {
    info: TransactionInformation,
    published: Vec<SysMessageId>,
    consumed: Vec<(SysMessageId, Vec<ConsumerUid>)>,
    stored: HashMap<ConsumerUid, ConsumerUid>,
    remote_acks: Option<Vec<RemoteTransactionAckEntry>>,
    home_broker: Option<TransactionBroker>,
}

/// In-memory transaction list, ordered by transaction id.
#[derive(Default)]
pub struct InMemoryTransactionList {
    entries: RwLock<BTreeMap<TransactionUid, TxnEntry>>,
}

impl InMemoryTransactionList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_transaction(&self, info: TransactionInformation) {
        self.entries.write().insert(
            info.tid,
            TxnEntry {
                info,
                published: Vec::new(),
                consumed: Vec::new(),
                stored: HashMap::new(),
                remote_acks: None,
                home_broker: None,
            },
        );
    }

    pub fn add_published(&self, tid: TransactionUid, message_id: SysMessageId) {
        self.with_entry(tid, |e| e.published.push(message_id));
    }

    pub fn add_consumed(&self, tid: TransactionUid, message_id: SysMessageId, consumers: Vec<ConsumerUid>) {
        self.with_entry(tid, |e| e.consumed.push((message_id, consumers)));
    }

    pub fn map_stored_consumer(&self, tid: TransactionUid, transient: ConsumerUid, stored: ConsumerUid) {
        self.with_entry(tid, |e| {
            e.stored.insert(transient, stored);
        });
    }

    pub fn set_remote_acks(&self, tid: TransactionUid, entries: Vec<RemoteTransactionAckEntry>) {
        self.with_entry(tid, |e| e.remote_acks = Some(entries));
    }

    pub fn set_home_broker(&self, tid: TransactionUid, broker: TransactionBroker) {
        self.with_entry(tid, |e| e.home_broker = Some(broker));
    }

    fn with_entry(&self, tid: TransactionUid, f: impl FnOnce(&mut TxnEntry)) {
        if let Some(entry) = self.entries.write().get_mut(&tid) {
            f(entry);
        }
    }

    fn read_entry<T: Default>(&self, tid: TransactionUid, f: impl FnOnce(&TxnEntry) -> T) -> T {
        self.entries.read().get(&tid).map(f).unwrap_or_default()
    }
}

impl TransactionList for InMemoryTransactionList {
    fn transactions(&self) -> Vec<TransactionInformation> {
        self.entries
            .read()
            .values()
            .filter(|e| e.info.kind != TransactionKind::Remote)
            .map(|e| e.info.clone())
            .collect()
    }

    fn remote_transactions(&self) -> Vec<TransactionInformation> {
        self.entries
            .read()
            .values()
            .filter(|e| e.info.kind == TransactionKind::Remote)
            .map(|e| e.info.clone())
            .collect()
    }

    fn published_messages(&self, tid: TransactionUid) -> Vec<SysMessageId> {
        self.read_entry(tid, |e| e.published.clone())
    }

    fn consumed_messages(&self, tid: TransactionUid) -> Vec<(SysMessageId, Vec<ConsumerUid>)> {
        self.read_entry(tid, |e| e.consumed.clone())
    }

    fn stored_consumer_uids(&self, tid: TransactionUid) -> HashMap<ConsumerUid, ConsumerUid> {
        self.read_entry(tid, |e| e.stored.clone())
    }

    fn recovery_remote_acks(&self, tid: TransactionUid) -> Option<Vec<RemoteTransactionAckEntry>> {
        self.read_entry(tid, |e| e.remote_acks.clone())
    }

    fn remote_transaction_home_broker(&self, tid: TransactionUid) -> Option<TransactionBroker> {
        self.read_entry(tid, |e| e.home_broker.clone())
    }
}
