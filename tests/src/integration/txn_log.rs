//! # Transaction Log Flows
//!
//! Destinations interned by the mq-01 registry flow through mq-02
//! conversion and come back out of the durable log intact.
//!
//! ## Flow Tested:
//!
//! 1. Publisher sends to a concrete topic inside a transaction
//! 2. The store routes it to the consumers whose wildcard subscriptions match
//! 3. The transaction is prepared and converted
//! 4. Records decode back, with identities equal to the interned ones

#[cfg(test)]
mod tests {
    use std::net::{IpAddr, Ipv4Addr};
    use std::sync::Arc;

    use mq_01_destination::{DestinationRegistry, DestinationResolver, DestinationUid};
    use mq_02_txn_log::adapters::{InMemoryMessageLookup, InMemoryTransactionList, InMemoryTxnLogStore};
    use mq_02_txn_log::{
        ConverterConfig, PacketReference, RemoteTransactionAckEntry, TransactionAcknowledgement,
        TransactionBroker, TransactionInformation, TransactionState, TxnLogConversionApi,
        TxnLogConverter, TxnLogError, TxnLogRecord,
    };
    use shared_types::{AckMode, BrokerAddress, ConsumerUid, SysMessageId, TransactionUid, Xid};

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    type Converter = TxnLogConverter<InMemoryTxnLogStore, InMemoryMessageLookup, InMemoryTransactionList>;

    struct Broker {
        registry: DestinationRegistry,
        store: Arc<InMemoryTxnLogStore>,
        messages: Arc<InMemoryMessageLookup>,
        list: Arc<InMemoryTransactionList>,
        converter: Converter,
        /// (subscription, durable consumer)
        subscriptions: Vec<(DestinationUid, ConsumerUid)>,
    }

    fn broker() -> Broker {
        let store = Arc::new(InMemoryTxnLogStore::new());
        let messages = Arc::new(InMemoryMessageLookup::new());
        let list = Arc::new(InMemoryTransactionList::new());
        let converter = TxnLogConverter::new(
            ConverterConfig::default(),
            store.clone(),
            messages.clone(),
            list.clone(),
        );
        Broker {
            registry: DestinationRegistry::new(),
            store,
            messages,
            list,
            converter,
            subscriptions: Vec::new(),
        }
    }

    fn mid(seq: u32) -> SysMessageId {
        SysMessageId::new(seq, IpAddr::V4(Ipv4Addr::new(192, 168, 1, 7)), 7676, 1_700_000_000)
    }

    impl Broker {
        fn subscribe(&mut self, pattern: &str, consumer: u64) {
            let uid = self.registry.get_uid(pattern, false).unwrap();
            let consumer = ConsumerUid::new(consumer)
                .with_ack_mode(AckMode::Client)
                .unwrap();
            self.subscriptions.push((uid, consumer));
        }

        /// Publish to a concrete topic and route it like the store would.
        fn publish(&self, topic: &str, seq: u32) -> (DestinationUid, SysMessageId) {
            let dest = self.registry.get_uid(topic, false).unwrap();
            let id = mid(seq);
            self.messages
                .insert(PacketReference::new(id, dest.clone(), seq.to_be_bytes().to_vec()));
            let interests: Vec<ConsumerUid> = self
                .subscriptions
                .iter()
                .filter(|(sub, _)| sub.matches(&dest).unwrap())
                .map(|(_, c)| c.clone())
                .collect();
            self.store.set_interests(dest.clone(), id, interests);
            (dest, id)
        }
    }

    // =============================================================================
    // INTEGRATION TESTS
    // =============================================================================

    #[tokio::test]
    async fn test_wildcard_routed_interests_are_logged() {
        let mut b = broker();
        b.subscribe("prices.>", 1);
        b.subscribe("prices.*.fx", 2);
        b.subscribe("orders.**", 3);

        let info = TransactionInformation::local(TransactionUid(42), TransactionState::Prepared)
            .with_xid(Xid::new(1, vec![0xca, 0xfe], vec![0x01]));
        b.list.add_transaction(info.clone());
        let (fx, fx_id) = b.publish("prices.eu.fx", 1);
        let (_, eq_id) = b.publish("prices.us.equity", 2);
        b.list.add_published(info.tid, fx_id);
        b.list.add_published(info.tid, eq_id);

        let report = b.converter.convert(&info).await.unwrap();
        assert_eq!(report.sent, 2);
        assert_eq!(report.removed, 2);

        let records = b.store.records().unwrap();
        let TxnLogRecord::Local(txn) = &records[0] else {
            panic!("expected local record, got {:?}", records[0]);
        };
        assert_eq!(txn.xid, info.xid);
        let sent = txn.work.sent_messages();
        assert_eq!(sent[0].destination, fx);
        let ids: Vec<u64> = sent[0].stored_interests.iter().map(|c| c.id()).collect();
        assert_eq!(ids, vec![1, 2]);
        let ids: Vec<u64> = sent[1].stored_interests.iter().map(|c| c.id()).collect();
        assert_eq!(ids, vec![1]);
    }

    #[tokio::test]
    async fn test_decoded_destinations_equal_interned_ones() {
        let b = broker();
        let info = TransactionInformation::local(TransactionUid(1), TransactionState::Prepared);
        b.list.add_transaction(info.clone());
        let (dest, id) = b.publish("audit/eu", 1);
        b.list.add_published(info.tid, id);

        b.converter.convert(&info).await.unwrap();

        let records = b.store.records().unwrap();
        let decoded = &records[0].work().unwrap().sent_messages()[0].destination;
        assert_eq!(decoded, &dest);
        assert_eq!(decoded.unique_string(), "T:audit_eu");
        assert!(!decoded.is_queue());

        // the durable key is also what a JSON dump shows
        let json = serde_json::to_string(&records[0]).unwrap();
        assert!(json.contains("T:audit_eu"));
    }

    #[tokio::test]
    async fn test_reconverting_yields_identical_records() {
        let b = broker();
        let info = TransactionInformation::local(TransactionUid(3), TransactionState::Prepared);
        b.list.add_transaction(info.clone());
        for seq in 1..=3 {
            let (_, id) = b.publish("prices.eu", seq);
            b.list.add_published(info.tid, id);
        }
        let (_, consumed) = b.publish("orders.new", 10);
        b.list.add_consumed(info.tid, consumed, vec![ConsumerUid::new(500)]);
        b.list
            .map_stored_consumer(info.tid, ConsumerUid::new(500), ConsumerUid::new(5));

        b.converter.convert(&info).await.unwrap();
        b.converter.convert(&info).await.unwrap();

        let records = b.store.records().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0], records[1]);
        let work = records[0].work().unwrap();
        assert_eq!(work.num_sent(), 3);
        assert_eq!(work.message_acks()[0].consumer, ConsumerUid::new(5));
    }

    #[tokio::test]
    async fn test_recovery_batch_over_all_kinds() {
        let b = broker();
        let (_, id) = b.publish("prices.eu", 1);

        let local = TransactionInformation::local(TransactionUid(1), TransactionState::Prepared);
        b.list.add_transaction(local.clone());
        b.list.add_published(local.tid, id);

        let peer = BrokerAddress::new("peer-b", 7677);
        let cluster = TransactionInformation::cluster(
            TransactionUid(2),
            TransactionState::Prepared,
            vec![TransactionBroker::new(peer.clone())],
        );
        b.list.add_transaction(cluster);

        let remote = TransactionInformation::remote(TransactionUid(3), TransactionState::Prepared);
        b.list.add_transaction(remote.clone());
        b.list.set_remote_acks(
            remote.tid,
            vec![RemoteTransactionAckEntry {
                acks: vec![TransactionAcknowledgement {
                    message_id: id,
                    consumer: ConsumerUid::new(9),
                    stored_consumer: ConsumerUid::new(9),
                }],
            }],
        );
        b.list
            .set_home_broker(remote.tid, TransactionBroker::new(peer.clone()));

        // no acks recorded for this one
        let broken = TransactionInformation::remote(TransactionUid(4), TransactionState::Prepared);
        b.list.add_transaction(broken);

        let reports = b.converter.convert_all().await.unwrap();
        let kinds: Vec<(u64, &str)> = reports.iter().map(|r| (r.tid.0, r.kind)).collect();
        assert_eq!(kinds, vec![(1, "local"), (2, "cluster"), (3, "remote")]);

        let records = b.store.records().unwrap();
        assert_eq!(records.len(), 3);
        match &records[2] {
            TxnLogRecord::Remote(txn) => {
                assert_eq!(txn.home_broker, peer);
                assert_eq!(txn.destinations.len(), 1);
                assert!(txn.destinations[0].is_some());
            }
            other => panic!("expected remote record, got {:?}", other),
        }

        let err = b
            .converter
            .convert(&TransactionInformation::remote(TransactionUid(4), TransactionState::Prepared))
            .await
            .unwrap_err();
        assert!(matches!(err, TxnLogError::MissingRemoteAcks { .. }));
    }

    #[tokio::test]
    async fn test_clearing_registry_does_not_break_logged_identities() {
        let b = broker();
        let info = TransactionInformation::local(TransactionUid(8), TransactionState::Prepared);
        b.list.add_transaction(info.clone());
        let (dest, id) = b.publish("prices.eu", 1);
        b.list.add_published(info.tid, id);

        b.converter.convert(&info).await.unwrap();
        b.registry.clear();

        let reinterned = b.registry.get_uid("prices.eu", false).unwrap();
        let records = b.store.records().unwrap();
        let logged = &records[0].work().unwrap().sent_messages()[0].destination;
        assert_eq!(logged, &reinterned);
        assert_eq!(logged, &dest);
    }
}
