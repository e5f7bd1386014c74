//! Transaction Log Converter - turns prepared transactions into durable
//! transaction log records.
//!
//! The three transaction kinds share one skeleton:
//!
//! ```text
//! check state ──→ collect sent ──→ collect acks ──→ assemble record ──→ log_txn ──→ remove prepared copies
//!                      │                │
//!                      └── unresolved message: warn, skip
//! ```
//!
//! Remote transactions skip the sent/ack collection and build their record
//! from the acknowledgments recovered from the home broker.

use crate::domain::{
    ClusterTransaction, LocalTransaction, RemoteTransaction, TransactionBroker,
    TransactionInformation, TransactionKind, TransactionWork, TransactionWorkMessage,
    TransactionWorkMessageAck, TxnLogRecord,
};
use crate::error::{TxnLogError, TxnLogResult};
use crate::metrics;
use crate::ports::inbound::{ConversionReport, TxnLogConversionApi};
use crate::ports::outbound::{MessageLookup, TransactionList, TxnLogStore};
use async_trait::async_trait;
use mq_01_destination::DestinationUid;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Converter configuration
#[derive(Clone, Debug)]
pub struct ConverterConfig {
    /// Remove the prepared copy of every sent message once its record is
    /// logged.
    pub remove_sent_messages: bool,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            remove_sent_messages: true,
        }
    }
}

impl ConverterConfig {
    /// Load from environment.
    ///
    /// `MQ_TXNLOG_REMOVE_SENT_MESSAGES=false` keeps prepared copies.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            remove_sent_messages: std::env::var("MQ_TXNLOG_REMOVE_SENT_MESSAGES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.remove_sent_messages),
        }
    }
}

/// Transaction log converter.
pub struct TxnLogConverter<S, M, L>
where
    S: TxnLogStore,
    M: MessageLookup,
    L: TransactionList,
{
    config: ConverterConfig,
    store: Arc<S>,
    messages: Arc<M>,
    transactions: Arc<L>,
}

impl<S, M, L> TxnLogConverter<S, M, L>
where
    S: TxnLogStore,
    M: MessageLookup,
    L: TransactionList,
{
    pub fn new(config: ConverterConfig, store: Arc<S>, messages: Arc<M>, transactions: Arc<L>) -> Self {
        Self {
            config,
            store,
            messages,
            transactions,
        }
    }

    fn check_state(&self, info: &TransactionInformation) {
        if info.state.is_prepared() {
            return;
        }
        match info.kind {
            TransactionKind::Local => {
                info!(tid = %info.tid, state = %info.state, "[mq-02] ignoring state for {}", info)
            }
            _ => error!(tid = %info.tid, state = %info.state, "[mq-02] unexpected state for {}", info),
        }
    }

    async fn collect_sent(
        &self,
        info: &TransactionInformation,
        work: &mut TransactionWork,
        report: &mut ConversionReport,
    ) -> TxnLogResult<()> {
        for message_id in self.transactions.published_messages(info.tid) {
            let Some(packet) = self.messages.get(&message_id) else {
                warn!(tid = %info.tid, %message_id, "[mq-02] can not find packet for sent message");
                report.unresolved += 1;
                metrics::record_unresolved_message();
                continue;
            };

            let destination = packet.destination.clone();
            let stored_interests = self.store.consumer_uids_for(&destination, &message_id).await?;
            work.add_message(TransactionWorkMessage {
                message: packet,
                destination,
                stored_interests,
            });
        }
        Ok(())
    }

    fn collect_consumed(
        &self,
        info: &TransactionInformation,
        work: &mut TransactionWork,
        report: &mut ConversionReport,
    ) {
        let stored = self.transactions.stored_consumer_uids(info.tid);

        for (message_id, consumers) in self.transactions.consumed_messages(info.tid) {
            let Some(packet) = self.messages.get(&message_id) else {
                warn!(tid = %info.tid, %message_id, "[mq-02] can not find packet for consumed message");
                report.unresolved += 1;
                metrics::record_unresolved_message();
                continue;
            };

            for consumer in consumers {
                let consumer = match stored.get(&consumer) {
                    Some(stored) => stored.clone(),
                    None => {
                        debug!(%consumer, "[mq-02] no stored consumer, using transient id");
                        consumer
                    }
                };
                work.add_message_ack(TransactionWorkMessageAck {
                    destination: packet.destination.clone(),
                    message_id,
                    consumer,
                });
            }
        }
    }

    /// Best-effort: the logged record is the source of truth from here on.
    async fn delete_sent(&self, work: &TransactionWork, report: &mut ConversionReport) {
        if !self.config.remove_sent_messages {
            return;
        }
        for sent in work.sent_messages() {
            let message_id = sent.message_id();
            match self
                .store
                .remove_message(&sent.destination, &message_id, true)
                .await
            {
                Ok(()) => report.removed += 1,
                Err(e) => {
                    error!(
                        %message_id,
                        destination = %sent.destination,
                        "[mq-02] could not remove transacted sent message during txn conversion: {}",
                        e
                    );
                    report.failed_removals += 1;
                    metrics::record_cleanup_failure();
                }
            }
        }
    }

    async fn convert_with_work(
        &self,
        info: &TransactionInformation,
        brokers: Option<&[TransactionBroker]>,
    ) -> TxnLogResult<ConversionReport> {
        let mut report = ConversionReport::new(info.tid, info.kind.label());
        let mut work = TransactionWork::new();

        self.collect_sent(info, &mut work, &mut report).await?;
        self.collect_consumed(info, &mut work, &mut report);
        report.sent = work.num_sent();
        report.acks = work.num_acks();

        let record = match brokers {
            None => TxnLogRecord::Local(LocalTransaction {
                tid: info.tid,
                state: info.state,
                xid: info.xid.clone(),
                work,
            }),
            Some(brokers) => TxnLogRecord::Cluster(ClusterTransaction {
                tid: info.tid,
                state: info.state,
                xid: info.xid.clone(),
                work,
                brokers: brokers.to_vec(),
            }),
        };

        self.store.log_txn(&record).await?;
        if let Some(work) = record.work() {
            self.delete_sent(work, &mut report).await;
        }
        Ok(report)
    }

    async fn convert_remote(&self, info: &TransactionInformation) -> TxnLogResult<ConversionReport> {
        let mut report = ConversionReport::new(info.tid, info.kind.label());

        let entries = self
            .transactions
            .recovery_remote_acks(info.tid)
            .filter(|entries| !entries.is_empty());
        let Some(entries) = entries else {
            error!(tid = %info.tid, "[mq-02] could not find remote transaction ack entries");
            return Err(TxnLogError::MissingRemoteAcks { tid: info.tid });
        };

        let acks: Vec<_> = entries.into_iter().flat_map(|entry| entry.acks).collect();
        let destinations: Vec<Option<DestinationUid>> = acks
            .iter()
            .map(|ack| match self.messages.get(&ack.message_id) {
                Some(packet) => Some(packet.destination),
                None => {
                    warn!(tid = %info.tid, message_id = %ack.message_id, "[mq-02] could not find packet for remote ack");
                    report.unresolved += 1;
                    metrics::record_unresolved_message();
                    None
                }
            })
            .collect();

        let Some(home) = self.transactions.remote_transaction_home_broker(info.tid) else {
            error!(tid = %info.tid, "[mq-02] remote transaction has no home broker");
            return Err(TxnLogError::MissingHomeBroker { tid: info.tid });
        };

        report.acks = acks.len();
        let record = TxnLogRecord::Remote(RemoteTransaction {
            tid: info.tid,
            state: info.state,
            acks,
            destinations,
            home_broker: home.address,
        });
        self.store.log_txn(&record).await?;
        Ok(report)
    }
}

fn outcome_label(result: &TxnLogResult<ConversionReport>) -> &'static str {
    match result {
        Ok(_) => "ok",
        Err(TxnLogError::MissingRemoteAcks { .. }) => "missing_acks",
        Err(TxnLogError::MissingHomeBroker { .. }) => "missing_home_broker",
        Err(_) => "store_error",
    }
}

#[async_trait]
impl<S, M, L> TxnLogConversionApi for TxnLogConverter<S, M, L>
where
    S: TxnLogStore,
    M: MessageLookup,
    L: TransactionList,
{
    async fn convert(&self, info: &TransactionInformation) -> TxnLogResult<ConversionReport> {
        debug!(tid = %info.tid, "[mq-02] converting {}", info);
        self.check_state(info);

        let result = match &info.kind {
            TransactionKind::Local => self.convert_with_work(info, None).await,
            TransactionKind::Cluster { brokers } => self.convert_with_work(info, Some(brokers)).await,
            TransactionKind::Remote => self.convert_remote(info).await,
        };

        metrics::record_conversion(info.kind.label(), outcome_label(&result));
        if let Ok(report) = &result {
            debug!(
                tid = %report.tid,
                sent = report.sent,
                acks = report.acks,
                removed = report.removed,
                "[mq-02] transaction logged"
            );
        }
        result
    }

    async fn convert_all(&self) -> TxnLogResult<Vec<ConversionReport>> {
        let local = self.transactions.transactions();
        let remote = self.transactions.remote_transactions();
        info!(
            local = local.len(),
            remote = remote.len(),
            "[mq-02] converting transaction list to txn log format"
        );

        let mut reports = Vec::with_capacity(local.len() + remote.len());
        for info in local.iter().chain(remote.iter()) {
            match self.convert(info).await {
                Ok(report) => reports.push(report),
                // already logged; the transaction stays unconverted
                Err(e) if e.is_per_transaction() => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(reports)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{InMemoryMessageLookup, InMemoryTransactionList, InMemoryTxnLogStore};
    use crate::domain::{
        PacketReference, RemoteTransactionAckEntry, TransactionAcknowledgement, TransactionState,
    };
    use shared_types::{BrokerAddress, ConsumerUid, SysMessageId, TransactionUid};
    use std::net::{IpAddr, Ipv4Addr};

    type Converter =
        TxnLogConverter<InMemoryTxnLogStore, InMemoryMessageLookup, InMemoryTransactionList>;

    struct Fixture {
        store: Arc<InMemoryTxnLogStore>,
        messages: Arc<InMemoryMessageLookup>,
        list: Arc<InMemoryTransactionList>,
        converter: Converter,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(InMemoryTxnLogStore::new());
        let messages = Arc::new(InMemoryMessageLookup::new());
        let list = Arc::new(InMemoryTransactionList::new());
        let converter = TxnLogConverter::new(
            ConverterConfig::default(),
            Arc::clone(&store),
            Arc::clone(&messages),
            Arc::clone(&list),
        );
        Fixture {
            store,
            messages,
            list,
            converter,
        }
    }

    fn mid(seq: u32) -> SysMessageId {
        SysMessageId::new(seq, IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1)), 7676, 5000)
    }

    fn orders() -> DestinationUid {
        DestinationUid::queue("orders").unwrap()
    }

    impl Fixture {
        /// Store a live message routed to one consumer.
        fn live(&self, seq: u32) -> SysMessageId {
            let id = mid(seq);
            self.messages
                .insert(PacketReference::new(id, orders(), vec![seq as u8]));
            self.store
                .set_interests(orders(), id, vec![ConsumerUid::new(100 + seq as u64)]);
            id
        }

        fn local(&self, tid: u64, sent: &[u32], consumed: &[u32]) -> TransactionInformation {
            let info =
                TransactionInformation::local(TransactionUid(tid), TransactionState::Prepared);
            self.list.add_transaction(info.clone());
            for seq in sent {
                let id = self.live(*seq);
                self.list.add_published(info.tid, id);
            }
            for seq in consumed {
                let id = self.live(*seq);
                self.list
                    .add_consumed(info.tid, id, vec![ConsumerUid::new(*seq as u64)]);
            }
            info
        }
    }

    #[tokio::test]
    async fn test_local_conversion_logs_all_work_and_cleans_up() {
        let f = fixture();
        let info = f.local(1, &[1, 2, 3], &[10, 11]);

        let report = f.converter.convert(&info).await.unwrap();

        assert_eq!(report.sent, 3);
        assert_eq!(report.acks, 2);
        assert_eq!(report.removed, 3);
        assert_eq!(f.store.removed().len(), 3);

        let records = f.store.records().unwrap();
        assert_eq!(records.len(), 1);
        let work = records[0].work().unwrap();
        assert_eq!(work.num_sent(), 3);
        assert_eq!(work.num_acks(), 2);
        assert_eq!(
            work.sent_messages()[0].stored_interests,
            vec![ConsumerUid::new(101)]
        );
    }

    #[tokio::test]
    async fn test_unresolvable_sent_message_is_skipped() {
        let f = fixture();
        let info = f.local(2, &[1, 2, 3], &[]);
        f.messages.remove(&mid(2));

        let report = f.converter.convert(&info).await.unwrap();

        assert_eq!(report.sent, 2);
        assert_eq!(report.unresolved, 1);
        let records = f.store.records().unwrap();
        let sent: Vec<_> = records[0]
            .work()
            .unwrap()
            .sent_messages()
            .iter()
            .map(|m| m.message_id())
            .collect();
        assert_eq!(sent, vec![mid(1), mid(3)]);
    }

    #[tokio::test]
    async fn test_consumed_acks_use_stored_consumer() {
        let f = fixture();
        let info = f.local(3, &[], &[7, 8]);
        f.list
            .map_stored_consumer(info.tid, ConsumerUid::new(7), ConsumerUid::new(700));

        f.converter.convert(&info).await.unwrap();

        let records = f.store.records().unwrap();
        let consumers: Vec<u64> = records[0]
            .work()
            .unwrap()
            .message_acks()
            .iter()
            .map(|a| a.consumer.id())
            .collect();
        // 8 has no stored counterpart
        assert_eq!(consumers, vec![700, 8]);
    }

    #[tokio::test]
    async fn test_not_prepared_is_logged_and_converted() {
        let f = fixture();
        let info = TransactionInformation::local(TransactionUid(4), TransactionState::Started);
        f.list.add_transaction(info.clone());

        f.converter.convert(&info).await.unwrap();

        let records = f.store.records().unwrap();
        assert_eq!(records[0].state(), TransactionState::Started);
    }

    #[tokio::test]
    async fn test_cluster_record_carries_brokers() {
        let f = fixture();
        let brokers = vec![
            TransactionBroker::new(BrokerAddress::new("a", 1)),
            TransactionBroker::new(BrokerAddress::new("b", 2)),
        ];
        let info = TransactionInformation::cluster(
            TransactionUid(5),
            TransactionState::Prepared,
            brokers.clone(),
        );
        f.list.add_transaction(info.clone());
        let id = f.live(1);
        f.list.add_published(info.tid, id);

        let report = f.converter.convert(&info).await.unwrap();
        assert_eq!(report.kind, "cluster");

        match &f.store.records().unwrap()[0] {
            TxnLogRecord::Cluster(txn) => {
                assert_eq!(txn.brokers, brokers);
                assert_eq!(txn.work.num_sent(), 1);
            }
            other => panic!("expected cluster record, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_remote_conversion_flattens_ack_entries() {
        let f = fixture();
        let info = TransactionInformation::remote(TransactionUid(6), TransactionState::Prepared);
        f.list.add_transaction(info.clone());
        let known = f.live(1);
        let ack = |id: SysMessageId| TransactionAcknowledgement {
            message_id: id,
            consumer: ConsumerUid::new(1),
            stored_consumer: ConsumerUid::new(1),
        };
        f.list.set_remote_acks(
            info.tid,
            vec![
                RemoteTransactionAckEntry { acks: vec![ack(known)] },
                RemoteTransactionAckEntry { acks: vec![ack(mid(99))] },
            ],
        );
        let home = BrokerAddress::new("home", 7676);
        f.list
            .set_home_broker(info.tid, TransactionBroker::new(home.clone()));

        let report = f.converter.convert(&info).await.unwrap();
        assert_eq!(report.acks, 2);
        assert_eq!(report.unresolved, 1);
        assert!(f.store.removed().is_empty());

        match &f.store.records().unwrap()[0] {
            TxnLogRecord::Remote(txn) => {
                assert_eq!(txn.acks.len(), 2);
                assert_eq!(txn.destinations, vec![Some(orders()), None]);
                assert_eq!(txn.home_broker, home);
            }
            other => panic!("expected remote record, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_remote_without_acks_writes_nothing() {
        let f = fixture();
        let info = TransactionInformation::remote(TransactionUid(7), TransactionState::Prepared);
        f.list.add_transaction(info.clone());

        let err = f.converter.convert(&info).await.unwrap_err();
        assert_eq!(err, TxnLogError::MissingRemoteAcks { tid: info.tid });

        f.list.set_remote_acks(info.tid, Vec::new());
        assert!(f.converter.convert(&info).await.is_err());
        assert_eq!(f.store.record_count(), 0);
    }

    #[tokio::test]
    async fn test_conversion_is_repeatable() {
        let f = fixture();
        let info = f.local(8, &[1, 2], &[3]);

        f.converter.convert(&info).await.unwrap();
        f.converter.convert(&info).await.unwrap();

        let records = f.store.records().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0], records[1]);
        assert_eq!(records[1].work().unwrap().num_sent(), 2);
    }

    #[tokio::test]
    async fn test_cleanup_failure_keeps_record() {
        let f = fixture();
        let info = f.local(9, &[1, 2], &[]);
        f.store.set_fail_removals(true);

        let report = f.converter.convert(&info).await.unwrap();

        assert_eq!(report.failed_removals, 2);
        assert_eq!(report.removed, 0);
        assert_eq!(f.store.record_count(), 1);
    }

    #[tokio::test]
    async fn test_store_failure_propagates_without_cleanup() {
        let f = fixture();
        let info = f.local(10, &[1], &[]);
        f.store.set_fail_writes(true);

        let err = f.converter.convert(&info).await.unwrap_err();
        assert!(matches!(err, TxnLogError::StoreWrite { .. }));
        assert_eq!(err.status(), shared_types::Status::Error);
        assert!(f.store.removed().is_empty());
    }

    #[tokio::test]
    async fn test_cleanup_can_be_disabled() {
        let f = fixture();
        let converter = TxnLogConverter::new(
            ConverterConfig {
                remove_sent_messages: false,
            },
            Arc::clone(&f.store),
            Arc::clone(&f.messages),
            Arc::clone(&f.list),
        );
        let info = f.local(11, &[1], &[]);

        let report = converter.convert(&info).await.unwrap();
        assert_eq!(report.removed, 0);
        assert!(f.store.removed().is_empty());
    }

    #[tokio::test]
    async fn test_convert_all_skips_broken_remote_transactions() {
        let f = fixture();
        f.local(1, &[1], &[]);
        f.local(2, &[2], &[3]);
        f.list.add_transaction(TransactionInformation::remote(
            TransactionUid(3),
            TransactionState::Prepared,
        ));

        let reports = f.converter.convert_all().await.unwrap();

        let tids: Vec<_> = reports.iter().map(|r| r.tid).collect();
        assert_eq!(tids, vec![TransactionUid(1), TransactionUid(2)]);
        assert_eq!(f.store.record_count(), 2);
    }

    #[tokio::test]
    async fn test_convert_all_stops_on_store_failure() {
        let f = fixture();
        f.local(1, &[1], &[]);
        f.store.set_fail_writes(true);

        assert!(f.converter.convert_all().await.is_err());
    }
}
