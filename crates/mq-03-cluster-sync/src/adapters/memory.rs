//! In-memory adapters: a broker service whose restrictions can be flipped,
//! client connections that can be closed, a destination directory and an
//! error reporter that records every reply it is asked to send.

use crate::domain::{ServiceRestriction, ServiceType};
use crate::ports::outbound::{
    same_listener, BrokerService, ClientConnection, ConnectionClosedListener,
    DestinationDirectory, ErrorReporter, RestrictionListener,
};
use mq_01_destination::DestinationUid;
use parking_lot::RwLock;
use shared_types::{ConnectionState, ConnectionUid, PacketType, Status, MQ450_PROTOCOL};
use std::collections::HashSet;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

/// A reply captured by [`RecordingReporter`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SentError {
    pub connection: ConnectionUid,
    pub send_ack: bool,
    pub packet_type: PacketType,
    pub consumer_id: u64,
    pub message: String,
    pub status: Status,
}

/// Forwards every reply to a channel.
pub struct RecordingReporter {
    tx: UnboundedSender<SentError>,
}

impl RecordingReporter {
    pub fn new() -> (Arc<Self>, UnboundedReceiver<SentError>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Arc::new(Self { tx }), rx)
    }
}

impl ErrorReporter for RecordingReporter {
    fn send_error(
        &self,
        connection: &dyn ClientConnection,
        send_ack: bool,
        packet_type: PacketType,
        consumer_id: u64,
        message: &str,
        status: Status,
    ) {
        // receiver gone means nobody is listening any more
        let _ = self.tx.send(SentError {
            connection: connection.connection_uid(),
            send_ack,
            packet_type,
            consumer_id,
            message: message.to_string(),
            status,
        });
    }
}

/// Broker service with settable restrictions.
pub struct InMemoryService {
    name: String,
    service_type: ServiceType,
    restrictions: RwLock<Vec<ServiceRestriction>>,
    listeners: RwLock<Vec<Arc<dyn RestrictionListener>>>,
}

impl InMemoryService {
    pub fn new(name: impl Into<String>, service_type: ServiceType) -> Self {
        Self {
            name: name.into(),
            service_type,
            restrictions: RwLock::new(Vec::new()),
            listeners: RwLock::new(Vec::new()),
        }
    }

    /// Replace the restrictions and notify every registered listener.
    pub fn set_restrictions(&self, restrictions: Vec<ServiceRestriction>) {
        *self.restrictions.write() = restrictions;
        let listeners = self.listeners.read().clone();
        for listener in listeners {
            listener.service_restriction_changed();
        }
    }

    /// Swap restrictions without telling listeners; waiters only notice on
    /// their next periodic check.
    pub fn replace_restrictions(&self, restrictions: Vec<ServiceRestriction>) {
        *self.restrictions.write() = restrictions;
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.read().len()
    }
}

impl BrokerService for InMemoryService {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn service_type(&self) -> ServiceType {
        self.service_type
    }

    fn service_restrictions(&self) -> Vec<ServiceRestriction> {
        self.restrictions.read().clone()
    }

    fn add_restriction_listener(&self, listener: Arc<dyn RestrictionListener>) {
        self.listeners.write().push(listener);
    }

    fn remove_restriction_listener(&self, listener: &Arc<dyn RestrictionListener>) {
        let mut listeners = self.listeners.write();
        if let Some(pos) = listeners.iter().position(|l| same_listener(l, listener)) {
            listeners.remove(pos);
        }
    }
}

/// Client connection that can be closed on demand.
pub struct InMemoryConnection {
    uid: ConnectionUid,
    service: Arc<InMemoryService>,
    state: RwLock<ConnectionState>,
    protocol_version: AtomicU32,
    accessed: AtomicU64,
    listeners: RwLock<Vec<Arc<dyn ConnectionClosedListener>>>,
}

impl InMemoryConnection {
    /// An authenticated connection speaking the current protocol.
    pub fn new(uid: ConnectionUid, service: Arc<InMemoryService>) -> Self {
        Self {
            uid,
            service,
            state: RwLock::new(ConnectionState::Authenticated),
            protocol_version: AtomicU32::new(MQ450_PROTOCOL),
            accessed: AtomicU64::new(0),
            listeners: RwLock::new(Vec::new()),
        }
    }

    pub fn with_protocol_version(self, version: u32) -> Self {
        self.protocol_version.store(version, Ordering::SeqCst);
        self
    }

    /// Move to `Closed` and notify closed listeners.
    pub fn close(&self) {
        *self.state.write() = ConnectionState::Closed;
        let listeners = self.listeners.read().clone();
        for listener in listeners {
            listener.connection_closed(self.uid);
        }
    }

    /// How many times the access time was refreshed.
    pub fn access_count(&self) -> u64 {
        self.accessed.load(Ordering::SeqCst)
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.read().len()
    }
}

impl ClientConnection for InMemoryConnection {
    fn connection_uid(&self) -> ConnectionUid {
        self.uid
    }

    fn state(&self) -> ConnectionState {
        *self.state.read()
    }

    fn service(&self) -> Arc<dyn BrokerService> {
        self.service.clone()
    }

    fn client_protocol_version(&self) -> u32 {
        self.protocol_version.load(Ordering::SeqCst)
    }

    fn update_access_time(&self) {
        self.accessed.fetch_add(1, Ordering::SeqCst);
    }

    fn add_closed_listener(&self, listener: Arc<dyn ConnectionClosedListener>) {
        self.listeners.write().push(listener);
    }

    fn remove_closed_listener(&self, listener: &Arc<dyn ConnectionClosedListener>) {
        let mut listeners = self.listeners.write();
        if let Some(pos) = listeners.iter().position(|l| same_listener(l, listener)) {
            listeners.remove(pos);
        }
    }
}

/// Set of existing destinations.
#[derive(Default)]
pub struct InMemoryDestinationDirectory {
    destinations: RwLock<HashSet<DestinationUid>>,
}

impl InMemoryDestinationDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, destination: DestinationUid) {
        self.destinations.write().insert(destination);
    }

    pub fn remove(&self, destination: &DestinationUid) -> bool {
        self.destinations.write().remove(destination)
    }
}

impl DestinationDirectory for InMemoryDestinationDirectory {
    fn exists(&self, destination: &DestinationUid) -> bool {
        self.destinations.read().contains(destination)
    }
}
