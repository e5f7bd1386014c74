//! Service restriction gate.
//!
//! Decides, for an inbound packet, whether it may proceed or must wait for
//! master broker sync. Only packets on a `Normal` service are gated:
//!
//! | Packet | Waits while `NoSyncWithMasterBroker` when |
//! |--------|-------------------------------------------|
//! | `CreateDestination` | auto-create allowed, destination missing, not a temporary queue |
//! | `AddProducer` | destination is a topic |
//! | `AddConsumer` | destination is a topic |
//!
//! A waiting packet is handed to the [`SyncWaiter`]. Clients older than the
//! wait protocol, or a waiter that refuses the request, get `Unavailable`.

use crate::config::GateConfig;
use crate::domain::{is_restrictable, InboundRequest, ServiceRestriction, ServiceType};
use crate::error::{ClusterSyncError, ClusterSyncResult};
use crate::ports::inbound::SyncWaiter;
use crate::ports::outbound::{ClientConnection, DestinationDirectory};
use crate::service::WaitRequest;
use mq_01_destination::DestinationResolver;
use shared_types::{PacketType, MQ450_PROTOCOL};
use std::sync::Arc;
use tracing::warn;

/// Outcome of a gate check.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GateDecision {
    /// Handle the packet now.
    Proceed,
    /// Parked with the waiter; the reply comes later.
    Waiting { message: String },
}

pub struct RestrictionGate<R, D, W>
where
    R: DestinationResolver,
    D: DestinationDirectory,
    W: SyncWaiter,
{
    config: GateConfig,
    resolver: Arc<R>,
    directory: Arc<D>,
    waiter: Arc<W>,
}

impl<R, D, W> RestrictionGate<R, D, W>
where
    R: DestinationResolver,
    D: DestinationDirectory,
    W: SyncWaiter,
{
    pub fn new(config: GateConfig, resolver: Arc<R>, directory: Arc<D>, waiter: Arc<W>) -> Self {
        Self {
            config,
            resolver,
            directory,
            waiter,
        }
    }

    /// Check `request` against the restrictions of its connection's service.
    pub fn check(
        &self,
        request: &InboundRequest,
        connection: Arc<dyn ClientConnection>,
    ) -> ClusterSyncResult<GateDecision> {
        let service = connection.service();
        if service.service_type() != ServiceType::Normal || !is_restrictable(request.packet_type) {
            return Ok(GateDecision::Proceed);
        }

        let restriction = ServiceRestriction::NoSyncWithMasterBroker;
        if !service.service_restrictions().contains(&restriction) {
            return Ok(GateDecision::Proceed);
        }
        let Some(reason) = self.wait_reason(request)? else {
            return Ok(GateDecision::Proceed);
        };

        let message = format!(
            "{} {} on service {} {}",
            reason,
            request.destination,
            service.name(),
            restriction
        );
        warn!(
            connection = %connection.connection_uid(),
            destination = %request.destination,
            "[mq-03] {}", message
        );
        self.wait(request, connection, message)
    }

    /// Why `request` must wait, or `None` if it may proceed.
    fn wait_reason(&self, request: &InboundRequest) -> ClusterSyncResult<Option<&'static str>> {
        let dest_type = request.dest_type;
        match request.packet_type {
            PacketType::CreateDestination => {
                if !self.config.autocreate_allowed(dest_type.is_queue) {
                    return Ok(None);
                }
                let uid = self
                    .resolver
                    .get_uid(&request.destination, dest_type.is_queue)?;
                if self.directory.exists(&uid) || (dest_type.is_queue && dest_type.is_temporary) {
                    return Ok(None);
                }
                Ok(Some("Can not auto-create destination"))
            }
            PacketType::AddProducer if dest_type.is_topic() => {
                Ok(Some("Can not add producer to topic"))
            }
            PacketType::AddConsumer if dest_type.is_topic() => {
                Ok(Some("Can not add consumer to topic"))
            }
            _ => Ok(None),
        }
    }

    fn wait(
        &self,
        request: &InboundRequest,
        connection: Arc<dyn ClientConnection>,
        message: String,
    ) -> ClusterSyncResult<GateDecision> {
        if connection.client_protocol_version() < MQ450_PROTOCOL {
            return Err(ClusterSyncError::ServiceRestricted { message });
        }
        let wait = WaitRequest {
            send_ack: request.send_ack,
            packet_type: request.packet_type,
            consumer_id: request.consumer_id,
            retry_message: message.clone(),
            error_message: message.clone(),
        };
        if !self.waiter.add_request(wait, connection) {
            return Err(ClusterSyncError::ServiceRestricted { message });
        }
        Ok(GateDecision::Waiting { message })
    }
}
