//! Ports for the cluster-sync subsystem.

pub mod inbound;
pub mod outbound;

pub use inbound::SyncWaiter;
pub use outbound::{
    same_listener, BrokerService, ClientConnection, ConnectionClosedListener,
    DestinationDirectory, ErrorReporter, RestrictionListener,
};
