//! Service restrictions and the request vocabulary the restriction gate
//! works with.

use serde::{Deserialize, Serialize};
use shared_types::PacketType;
use std::fmt;

/// A condition blocking some operations on a service.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ServiceRestriction {
    /// The broker has not yet synchronized with the master broker.
    NoSyncWithMasterBroker,
}

impl fmt::Display for ServiceRestriction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceRestriction::NoSyncWithMasterBroker => {
                f.write_str("[NO_SYNC_WITH_MASTERBROKER]")
            }
        }
    }
}

/// Kind of service a connection was accepted on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ServiceType {
    /// Client messaging.
    Normal,
    Admin,
}

/// Destination type carried by a request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DestType {
    pub is_queue: bool,
    pub is_temporary: bool,
}

impl DestType {
    pub const QUEUE: DestType = DestType {
        is_queue: true,
        is_temporary: false,
    };
    pub const TOPIC: DestType = DestType {
        is_queue: false,
        is_temporary: false,
    };
    pub const TEMP_QUEUE: DestType = DestType {
        is_queue: true,
        is_temporary: true,
    };

    pub fn is_topic(self) -> bool {
        !self.is_queue
    }
}

/// The fields of an inbound packet the gate and the waiter need.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InboundRequest {
    pub packet_type: PacketType,
    /// The client expects a reply.
    pub send_ack: bool,
    pub consumer_id: u64,
    pub destination: String,
    pub dest_type: DestType,
}

/// Whether a packet type can be held back by a service restriction.
pub fn is_restrictable(packet_type: PacketType) -> bool {
    matches!(
        packet_type,
        PacketType::CreateDestination | PacketType::AddProducer | PacketType::AddConsumer
    )
}
