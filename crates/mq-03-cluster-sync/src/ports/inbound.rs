//! Driving Ports (API - Inbound)

use crate::config::MaxWait;
use crate::ports::outbound::ClientConnection;
use crate::service::WaitRequest;
use std::sync::Arc;

/// Parks requests until master broker sync completes.
pub trait SyncWaiter: Send + Sync {
    /// Queue a request on behalf of `connection`.
    ///
    /// Returns `false` when the request was not queued (waiting disabled or
    /// the waiter shut down); the caller must then fail it itself.
    fn add_request(&self, request: WaitRequest, connection: Arc<dyn ClientConnection>) -> bool;

    fn max_wait(&self) -> MaxWait;
}
