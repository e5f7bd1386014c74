//! Error types for the cluster-sync subsystem.

use crate::domain::BrokerState;
use mq_01_destination::DestinationError;
use shared_types::Status;
use thiserror::Error;

/// Cluster-sync errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClusterSyncError {
    /// The operation is blocked by a service restriction and cannot wait.
    #[error("Service restricted: {message}")]
    ServiceRestricted { message: String },

    /// Broker state change not allowed from the current state.
    #[error("Invalid broker state transition: {from:?} -> {to:?}")]
    InvalidStateTransition { from: BrokerState, to: BrokerState },

    /// Link reported up while the broker is down.
    #[error("Invalid broker status: link up on a broker that is down")]
    InvalidStatus,

    /// Destination named by the request could not be addressed.
    #[error(transparent)]
    Destination(#[from] DestinationError),
}

impl ClusterSyncError {
    /// Reply status for the client.
    pub fn status(&self) -> Status {
        match self {
            ClusterSyncError::ServiceRestricted { .. } => Status::Unavailable,
            ClusterSyncError::InvalidStateTransition { .. } | ClusterSyncError::InvalidStatus => {
                Status::Conflict
            }
            ClusterSyncError::Destination(e) => e.status(),
        }
    }
}

/// Result type for cluster-sync operations
pub type ClusterSyncResult<T> = Result<T, ClusterSyncError>;
