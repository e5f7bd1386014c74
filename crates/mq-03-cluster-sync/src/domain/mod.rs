//! Domain layer: broker state and service restrictions.

pub mod broker_state;
pub mod restriction;

pub use broker_state::{BrokerState, BrokerStatus, ClusteredBroker, StatusChange};
pub use restriction::{is_restrictable, DestType, InboundRequest, ServiceRestriction, ServiceType};
