//! # Cluster Sync Flows
//!
//! A broker that has not synchronized with its master broker gates topic
//! producers/consumers and auto-created destinations through mq-03, with
//! destination names resolved by the mq-01 registry.
//!
//! ## Flow Tested:
//!
//! 1. Packet arrives on a restricted NORMAL service
//! 2. `RestrictionGate` parks it with the `MasterBrokerWaiter`
//! 3. The master broker link comes up, the restriction clears
//! 4. The client receives a RETRY reply (or UNAVAILABLE on timeout)

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use tokio::runtime::Handle;
    use tokio::sync::mpsc::UnboundedReceiver;

    use mq_01_destination::{DestinationRegistry, DestinationResolver};
    use mq_03_cluster_sync::adapters::{
        InMemoryConnection, InMemoryDestinationDirectory, InMemoryService, RecordingReporter,
        SentError,
    };
    use mq_03_cluster_sync::{
        ClientConnection, ClusteredBroker, DestType, GateConfig, GateDecision, InboundRequest,
        MasterBrokerWaiter, MaxWait, RestrictionGate, ServiceRestriction, ServiceType, SyncWaiter,
        WaiterConfig,
    };
    use shared_types::{BrokerAddress, ConnectionUid, PacketType, Status};

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    type Gate = RestrictionGate<DestinationRegistry, InMemoryDestinationDirectory, MasterBrokerWaiter>;

    struct Node {
        gate: Gate,
        waiter: Arc<MasterBrokerWaiter>,
        service: Arc<InMemoryService>,
        directory: Arc<InMemoryDestinationDirectory>,
        registry: Arc<DestinationRegistry>,
        replies: UnboundedReceiver<SentError>,
        master: ClusteredBroker,
    }

    fn node(max_wait: MaxWait) -> Node {
        let (reporter, replies) = RecordingReporter::new();
        let waiter = Arc::new(MasterBrokerWaiter::new(
            WaiterConfig {
                max_wait,
                ..WaiterConfig::default()
            },
            reporter,
            Handle::current(),
        ));
        let service = Arc::new(InMemoryService::new("jms", ServiceType::Normal));
        service.set_restrictions(vec![ServiceRestriction::NoSyncWithMasterBroker]);
        let directory = Arc::new(InMemoryDestinationDirectory::new());
        let registry = Arc::new(DestinationRegistry::new());
        let gate = RestrictionGate::new(
            GateConfig::default(),
            registry.clone(),
            directory.clone(),
            waiter.clone(),
        );
        Node {
            gate,
            waiter,
            service,
            directory,
            registry,
            replies,
            master: ClusteredBroker::new(BrokerAddress::new("master", 7676), 1),
        }
    }

    impl Node {
        fn connect(&self, id: u64) -> Arc<InMemoryConnection> {
            Arc::new(InMemoryConnection::new(ConnectionUid(id), self.service.clone()))
        }

        /// Master link up completes sync and lifts the restriction.
        fn master_linked(&mut self) {
            if let Some(change) = self.master.set_broker_link_up(true) {
                if change.new.is_link_up() {
                    self.service.set_restrictions(Vec::new());
                }
            }
        }
    }

    fn request(packet_type: PacketType, destination: &str, dest_type: DestType, consumer_id: u64) -> InboundRequest {
        InboundRequest {
            packet_type,
            send_ack: true,
            consumer_id,
            destination: destination.into(),
            dest_type,
        }
    }

    // =============================================================================
    // INTEGRATION TESTS
    // =============================================================================

    #[tokio::test(start_paused = true)]
    async fn test_parked_topic_consumer_retries_after_sync() {
        let mut n = node(MaxWait::from_secs(90));
        let conn: Arc<dyn ClientConnection> = n.connect(1);

        let decision = n
            .gate
            .check(&request(PacketType::AddConsumer, "prices.>", DestType::TOPIC, 21), conn)
            .unwrap();
        let GateDecision::Waiting { message } = decision else {
            panic!("expected the consumer to wait");
        };
        assert!(message.contains("prices.>"));
        assert_eq!(n.waiter.pending(), 1);

        tokio::time::sleep(Duration::from_secs(20)).await;
        n.master_linked();

        let reply = n.replies.recv().await.unwrap();
        assert_eq!(reply.status, Status::Retry);
        assert_eq!(reply.consumer_id, 21);
        assert_eq!(reply.packet_type, PacketType::AddConsumer);
        assert_eq!(reply.message, message);
        assert_eq!(n.service.listener_count(), 0);

        // once synced the same packet goes straight through
        let conn: Arc<dyn ClientConnection> = n.connect(1);
        let decision = n
            .gate
            .check(&request(PacketType::AddConsumer, "prices.>", DestType::TOPIC, 21), conn)
            .unwrap();
        assert_eq!(decision, GateDecision::Proceed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_parked_requests_time_out_unavailable() {
        let mut n = node(MaxWait::from_secs(30));
        mq_telemetry::register_metrics().unwrap();
        let _span = mq_telemetry::subsystem_span!("timeout_flow", subsystem = "mq-03").entered();

        for id in 1..=3 {
            let conn: Arc<dyn ClientConnection> = n.connect(id);
            n.gate
                .check(&request(PacketType::AddProducer, "prices.eu", DestType::TOPIC, id), conn)
                .unwrap();
        }
        assert_eq!(n.waiter.pending(), 3);

        let mut replies = Vec::new();
        for _ in 0..3 {
            let reply = n.replies.recv().await.unwrap();
            mq_telemetry::record_error("mq-03", reply.status);
            replies.push(reply);
        }

        assert!(replies.iter().all(|r| r.status == Status::Unavailable));
        assert_eq!(n.waiter.pending(), 0);
        let text = mq_telemetry::encode_metrics().unwrap();
        assert!(text.contains("subsystem=\"mq-03\""));
    }

    #[tokio::test(start_paused = true)]
    async fn test_auto_create_waits_only_for_missing_destinations() {
        let mut n = node(MaxWait::Forever);
        let existing = n.registry.get_uid("orders", true).unwrap();
        n.directory.insert(existing);

        let conn: Arc<dyn ClientConnection> = n.connect(1);
        let decision = n
            .gate
            .check(&request(PacketType::CreateDestination, "orders", DestType::QUEUE, 0), conn.clone())
            .unwrap();
        assert_eq!(decision, GateDecision::Proceed);

        let decision = n
            .gate
            .check(&request(PacketType::CreateDestination, "invoices", DestType::QUEUE, 0), conn)
            .unwrap();
        assert!(matches!(decision, GateDecision::Waiting { .. }));
        assert!(n.registry.contains("invoices", true));

        // forever means no timeout, only sync resolves it
        tokio::time::sleep(Duration::from_secs(600)).await;
        assert_eq!(n.waiter.pending(), 1);
        n.master_linked();
        assert_eq!(n.replies.recv().await.unwrap().status, Status::Retry);
    }

    #[tokio::test(start_paused = true)]
    async fn test_client_disconnect_while_parked() {
        let mut n = node(MaxWait::from_secs(90));
        let leaving = n.connect(1);
        let staying = n.connect(2);

        for conn in [leaving.clone(), staying.clone()] {
            let id = conn.connection_uid().0;
            let conn: Arc<dyn ClientConnection> = conn;
            n.gate
                .check(&request(PacketType::AddConsumer, "news", DestType::TOPIC, id), conn)
                .unwrap();
        }

        leaving.close();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(n.waiter.pending(), 1);
        assert_eq!(leaving.listener_count(), 0);

        n.master_linked();
        let reply = n.replies.recv().await.unwrap();
        assert_eq!(reply.connection, ConnectionUid(2));
        assert_eq!(reply.status, Status::Retry);
        assert!(n.replies.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_disabled_waiter_refuses_immediately() {
        let n = node(MaxWait::Disabled);
        let conn: Arc<dyn ClientConnection> = n.connect(1);

        let err = n
            .gate
            .check(&request(PacketType::AddProducer, "prices", DestType::TOPIC, 1), conn)
            .unwrap_err();

        assert_eq!(err.status(), Status::Unavailable);
        assert!(n.waiter.max_wait().is_disabled());
        assert!(!n.waiter.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_broker_shutdown_fails_parked_requests() {
        let mut n = node(MaxWait::Forever);
        let conn: Arc<dyn ClientConnection> = n.connect(1);
        n.gate
            .check(&request(PacketType::AddConsumer, "news", DestType::TOPIC, 4), conn.clone())
            .unwrap();

        n.waiter.shutdown();
        assert_eq!(n.replies.recv().await.unwrap().status, Status::Unavailable);

        let err = n
            .gate
            .check(&request(PacketType::AddConsumer, "news", DestType::TOPIC, 5), conn)
            .unwrap_err();
        assert_eq!(err.status(), Status::Unavailable);
    }
}
