//! Driven Ports (SPI - Outbound)
//!
//! The surrounding broker's services, connections and error replies.
//! Listener registration is by `Arc` identity: removing a listener removes
//! the registration made with the same `Arc`.

use crate::domain::{ServiceRestriction, ServiceType};
use mq_01_destination::DestinationUid;
use shared_types::{ConnectionState, ConnectionUid, PacketType, Status};
use std::sync::Arc;

/// Told when a service's restrictions change.
pub trait RestrictionListener: Send + Sync {
    fn service_restriction_changed(&self);
}

/// Told when a connection closes.
pub trait ConnectionClosedListener: Send + Sync {
    fn connection_closed(&self, connection: ConnectionUid);
}

/// A broker service (listener endpoint) connections are accepted on.
pub trait BrokerService: Send + Sync {
    fn name(&self) -> String;

    fn service_type(&self) -> ServiceType;

    /// Restrictions currently in force.
    fn service_restrictions(&self) -> Vec<ServiceRestriction>;

    fn add_restriction_listener(&self, listener: Arc<dyn RestrictionListener>);

    fn remove_restriction_listener(&self, listener: &Arc<dyn RestrictionListener>);
}

/// A client connection.
pub trait ClientConnection: Send + Sync {
    fn connection_uid(&self) -> ConnectionUid;

    fn state(&self) -> ConnectionState;

    /// The service this connection was accepted on.
    fn service(&self) -> Arc<dyn BrokerService>;

    fn client_protocol_version(&self) -> u32;

    /// Keep the connection from being reaped as idle.
    fn update_access_time(&self);

    fn add_closed_listener(&self, listener: Arc<dyn ConnectionClosedListener>);

    fn remove_closed_listener(&self, listener: &Arc<dyn ConnectionClosedListener>);
}

/// Sends an error reply for a request to its connection.
pub trait ErrorReporter: Send + Sync {
    fn send_error(
        &self,
        connection: &dyn ClientConnection,
        send_ack: bool,
        packet_type: PacketType,
        consumer_id: u64,
        message: &str,
        status: Status,
    );
}

/// Existing destinations.
pub trait DestinationDirectory: Send + Sync {
    fn exists(&self, destination: &DestinationUid) -> bool;
}

/// Compare listener registrations by the object they point to.
pub fn same_listener<T: ?Sized>(a: &Arc<T>, b: &Arc<T>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}
