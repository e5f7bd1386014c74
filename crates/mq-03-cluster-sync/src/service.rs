//! Master Broker Waiter - parks client operations until this broker has
//! synchronized with the cluster's master broker.
//!
//! Each parked request ends in exactly one of:
//!
//! ```text
//! QUEUED ──restriction cleared──→ RETRY  (Status::Retry, client re-issues)
//!    │
//!    ├──max wait / timer fired──→ ERROR  (Status::Unavailable)
//!    │
//!    ├──connection closed───────→ DROP   (no reply, teardown owns it)
//!    │
//!    └──waiter shut down────────→ ERROR
//! ```
//!
//! A single coordinator task evaluates the queue. It is spawned by the first
//! request, sleeps on a `Notify` woken by restriction changes, connection
//! closes and per-request timers (capped at the wait interval), and exits
//! when the queue drains. The next request spawns a new one. All queue
//! state, including whether a coordinator runs, sits behind one mutex.

use crate::config::{MaxWait, WaiterConfig};
use crate::domain::ServiceRestriction;
use crate::metrics;
use crate::ports::inbound::SyncWaiter;
use crate::ports::outbound::{
    BrokerService, ClientConnection, ConnectionClosedListener, ErrorReporter, RestrictionListener,
};
use parking_lot::Mutex;
use shared_types::{ConnectionUid, PacketType, Status};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// What a parked request needs to be answered later.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WaitRequest {
    pub send_ack: bool,
    pub packet_type: PacketType,
    pub consumer_id: u64,
    /// Sent with `Status::Retry` once sync completes.
    pub retry_message: String,
    /// Sent with `Status::Unavailable` on timeout or shutdown.
    pub error_message: String,
}

/// Decision for one queued request on a coordinator pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Resolution {
    Keep,
    Drop,
    Retry,
    Error,
}

impl Resolution {
    fn label(self) -> &'static str {
        match self {
            Resolution::Keep => "kept",
            Resolution::Drop => "dropped",
            Resolution::Retry => "retry",
            Resolution::Error => "error",
        }
    }
}

/// Decide a queued request's fate. Checks run in order and the first that
/// applies wins.
pub fn resolve(
    max_wait: MaxWait,
    total_waited: Duration,
    timed_out: bool,
    connection_closed: bool,
    restrictions: &[ServiceRestriction],
) -> Resolution {
    if connection_closed {
        return Resolution::Drop;
    }
    let expired = match max_wait {
        MaxWait::Forever => false,
        MaxWait::Bounded(max) => timed_out || total_waited >= max,
        // never queued: add_request refuses up front
        MaxWait::Disabled => true,
    };
    if expired {
        return Resolution::Error;
    }
    if !restrictions.contains(&ServiceRestriction::NoSyncWithMasterBroker) {
        return Resolution::Retry;
    }
    Resolution::Keep
}

struct Pending {
    id: u64,
    request: WaitRequest,
    connection: Arc<dyn ClientConnection>,
    service: Arc<dyn BrokerService>,
    total_waited: Duration,
    timed_out: bool,
    timer: Option<JoinHandle<()>>,
}

#[derive(Default)]
struct WaiterState {
    pending: Vec<Pending>,
    running: bool,
    shutdown: bool,
    next_id: u64,
}

struct Shared {
    config: WaiterConfig,
    reporter: Arc<dyn ErrorReporter>,
    state: Mutex<WaiterState>,
    wake: Notify,
}

impl Shared {
    fn wake(&self) {
        self.wake.notify_one();
    }

    fn request_timed_out(&self, id: u64) {
        if let Some(pending) = self.state.lock().pending.iter_mut().find(|p| p.id == id) {
            pending.timed_out = true;
        }
        self.wake();
    }

    /// Unregister a request that has left the queue.
    fn release(self: &Arc<Self>, pending: &Pending) {
        let restriction: Arc<dyn RestrictionListener> = self.clone();
        pending.service.remove_restriction_listener(&restriction);
        let closed: Arc<dyn ConnectionClosedListener> = self.clone();
        pending.connection.remove_closed_listener(&closed);
        if let Some(timer) = &pending.timer {
            timer.abort();
        }
    }

    fn answer(&self, pending: &Pending, resolution: Resolution) {
        let (message, status) = match resolution {
            Resolution::Retry => (&pending.request.retry_message, Status::Retry),
            Resolution::Error => (&pending.request.error_message, Status::Unavailable),
            Resolution::Keep | Resolution::Drop => return,
        };
        debug!(
            connection = %pending.connection.connection_uid(),
            %status,
            "[mq-03] answering parked request"
        );
        self.reporter.send_error(
            pending.connection.as_ref(),
            pending.request.send_ack,
            pending.request.packet_type,
            pending.request.consumer_id,
            message,
            status,
        );
    }
}

impl RestrictionListener for Shared {
    fn service_restriction_changed(&self) {
        self.wake();
    }
}

impl ConnectionClosedListener for Shared {
    fn connection_closed(&self, connection: ConnectionUid) {
        debug!(%connection, "[mq-03] connection closed while waiting for master broker");
        self.wake();
    }
}

/// Per-request timeout; holds only a weak reference to the waiter.
async fn expire(shared: Weak<Shared>, id: u64, after: Duration) {
    tokio::time::sleep(after).await;
    if let Some(shared) = shared.upgrade() {
        shared.request_timed_out(id);
    }
}

struct Snapshot {
    id: u64,
    connection: Arc<dyn ClientConnection>,
    service: Arc<dyn BrokerService>,
    total_waited: Duration,
    timed_out: bool,
}

async fn coordinate(shared: Arc<Shared>) {
    let max_wait = shared.config.max_wait;
    let interval = shared.config.wait_interval;
    let mut last_pass = Instant::now();
    let mut last_notice: Option<Instant> = None;
    info!("[mq-03] master broker waiter started");

    loop {
        let snapshot: Vec<Snapshot> = {
            let mut state = shared.state.lock();
            if state.pending.is_empty() {
                state.running = false;
                info!("[mq-03] master broker waiter exits");
                return;
            }
            state
                .pending
                .iter()
                .map(|p| Snapshot {
                    id: p.id,
                    connection: Arc::clone(&p.connection),
                    service: Arc::clone(&p.service),
                    total_waited: p.total_waited,
                    timed_out: p.timed_out,
                })
                .collect()
        };

        // collaborators are consulted outside the lock
        let decisions: Vec<(u64, Resolution)> = snapshot
            .iter()
            .map(|s| {
                let closed = s.connection.state().is_closed();
                let restrictions = if closed {
                    Vec::new()
                } else {
                    s.service.service_restrictions()
                };
                let resolution = resolve(max_wait, s.total_waited, s.timed_out, closed, &restrictions);
                if resolution != Resolution::Drop {
                    s.connection.update_access_time();
                }
                (s.id, resolution)
            })
            .collect();
        drop(snapshot);

        let (resolved, waiting) = {
            let mut state = shared.state.lock();
            let mut resolved = Vec::new();
            for (id, resolution) in decisions {
                if resolution == Resolution::Keep {
                    continue;
                }
                // shutdown may have drained it already
                if let Some(pos) = state.pending.iter().position(|p| p.id == id) {
                    resolved.push((state.pending.remove(pos), resolution));
                }
            }
            metrics::set_pending(state.pending.len());
            let waiting: Vec<u64> = state.pending.iter().map(|p| p.id).collect();
            (resolved, waiting)
        };

        for (pending, _) in &resolved {
            shared.release(pending);
        }
        for wanted in [Resolution::Retry, Resolution::Error, Resolution::Drop] {
            for (pending, resolution) in resolved.iter().filter(|(_, r)| *r == wanted) {
                if *resolution == Resolution::Drop {
                    debug!(
                        connection = %pending.connection.connection_uid(),
                        "[mq-03] dropping request of closed connection"
                    );
                }
                shared.answer(pending, *resolution);
                metrics::record_resolved(resolution.label());
            }
        }
        drop(resolved);

        if waiting.is_empty() {
            continue;
        }

        if last_notice.map_or(true, |at| at.elapsed() >= interval) {
            info!(
                pending = waiting.len(),
                interval_secs = interval.as_secs(),
                max_wait = ?max_wait,
                "[mq-03] waiting for sync with master broker"
            );
            last_notice = Some(Instant::now());
        }

        tokio::select! {
            _ = shared.wake.notified() => {}
            _ = tokio::time::sleep(interval) => {}
        }

        let now = Instant::now();
        let waited = now.saturating_duration_since(last_pass);
        last_pass = now;
        if max_wait != MaxWait::Forever {
            let mut state = shared.state.lock();
            for pending in state.pending.iter_mut().filter(|p| waiting.contains(&p.id)) {
                pending.total_waited += waited;
            }
        }
    }
}

/// Queues operations until master broker sync completes.
pub struct MasterBrokerWaiter {
    shared: Arc<Shared>,
    runtime: Handle,
}

impl MasterBrokerWaiter {
    /// Create a waiter whose tasks run on `runtime`.
    pub fn new(config: WaiterConfig, reporter: Arc<dyn ErrorReporter>, runtime: Handle) -> Self {
        Self {
            shared: Arc::new(Shared {
                config,
                reporter,
                state: Mutex::new(WaiterState::default()),
                wake: Notify::new(),
            }),
            runtime,
        }
    }

    /// Number of queued requests.
    pub fn pending(&self) -> usize {
        self.shared.state.lock().pending.len()
    }

    /// Whether a coordinator task is currently alive.
    pub fn is_running(&self) -> bool {
        self.shared.state.lock().running
    }

    /// Fail every queued request and refuse new ones.
    pub fn shutdown(&self) {
        let drained = {
            let mut state = self.shared.state.lock();
            state.shutdown = true;
            metrics::set_pending(0);
            std::mem::take(&mut state.pending)
        };
        if !drained.is_empty() {
            info!(
                count = drained.len(),
                "[mq-03] master broker waiter interrupted, failing waiting requests"
            );
        }
        for pending in &drained {
            self.shared.release(pending);
            self.shared.answer(pending, Resolution::Error);
            metrics::record_resolved(Resolution::Error.label());
        }
        self.shared.wake();
    }
}

impl SyncWaiter for MasterBrokerWaiter {
    fn max_wait(&self) -> MaxWait {
        self.shared.config.max_wait
    }

    fn add_request(&self, request: WaitRequest, connection: Arc<dyn ClientConnection>) -> bool {
        let max_wait = self.shared.config.max_wait;
        if max_wait.is_disabled() {
            return false;
        }

        let service = connection.service();
        let mut state = self.shared.state.lock();
        if state.shutdown {
            warn!("[mq-03] master broker waiter is shut down, request not queued");
            return false;
        }

        let id = state.next_id;
        state.next_id += 1;
        service.add_restriction_listener(self.shared.clone());
        connection.add_closed_listener(self.shared.clone());
        let timer = match max_wait {
            MaxWait::Bounded(after) => Some(
                self.runtime
                    .spawn(expire(Arc::downgrade(&self.shared), id, after)),
            ),
            MaxWait::Forever | MaxWait::Disabled => None,
        };

        debug!(
            connection = %connection.connection_uid(),
            packet_type = request.packet_type.code(),
            "[mq-03] request queued to wait for master broker"
        );
        state.pending.push(Pending {
            id,
            request,
            connection,
            service,
            total_waited: Duration::ZERO,
            timed_out: false,
            timer,
        });
        metrics::record_queued();
        metrics::set_pending(state.pending.len());

        if !state.running {
            state.running = true;
            self.runtime.spawn(coordinate(Arc::clone(&self.shared)));
        }
        drop(state);

        self.shared.wake();
        true
    }
}
