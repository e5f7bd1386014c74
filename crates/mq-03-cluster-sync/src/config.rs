//! Cluster-sync configuration.
//!
//! ## Environment Variables
//!
//! | Variable | Default | Meaning |
//! |----------|---------|---------|
//! | `MQ_CLUSTER_NOWAIT_FOR_MASTERBROKER_TIMEOUT_SECS` | `90` | max wait; `0` disables waiting, negative waits forever |
//! | `MQ_AUTOCREATE_QUEUE` | `true` | queues may be auto-created |
//! | `MQ_AUTOCREATE_TOPIC` | `true` | topics may be auto-created |

use std::time::Duration;

/// Default max wait for master broker sync, in seconds.
pub const DEFAULT_MAX_WAIT_SECS: i64 = 90;

/// Default coordinator wake interval.
pub const DEFAULT_WAIT_INTERVAL: Duration = Duration::from_secs(15);

/// How long a request may wait for master broker sync.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MaxWait {
    /// Requests are never queued.
    Disabled,
    /// Requests wait until sync completes or their connection closes.
    Forever,
    /// Requests fail once they have waited this long.
    Bounded(Duration),
}

impl MaxWait {
    /// From the signed seconds value of the broker property.
    pub fn from_secs(secs: i64) -> Self {
        match secs {
            0 => MaxWait::Disabled,
            s if s < 0 => MaxWait::Forever,
            s => MaxWait::Bounded(Duration::from_secs(s.unsigned_abs())),
        }
    }

    pub fn is_disabled(self) -> bool {
        self == MaxWait::Disabled
    }
}

impl Default for MaxWait {
    fn default() -> Self {
        MaxWait::from_secs(DEFAULT_MAX_WAIT_SECS)
    }
}

/// Master broker waiter configuration
#[derive(Clone, Debug)]
pub struct WaiterConfig {
    pub max_wait: MaxWait,
    /// Longest the coordinator sleeps between passes; also paces the
    /// periodic wait notice.
    pub wait_interval: Duration,
}

impl Default for WaiterConfig {
    fn default() -> Self {
        Self {
            max_wait: MaxWait::default(),
            wait_interval: DEFAULT_WAIT_INTERVAL,
        }
    }
}

impl WaiterConfig {
    /// Load from environment.
    pub fn from_env() -> Self {
        let secs = std::env::var("MQ_CLUSTER_NOWAIT_FOR_MASTERBROKER_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(DEFAULT_MAX_WAIT_SECS);
        Self {
            max_wait: MaxWait::from_secs(secs),
            ..Self::default()
        }
    }
}

/// Restriction gate configuration
#[derive(Clone, Debug)]
pub struct GateConfig {
    pub autocreate_queue: bool,
    pub autocreate_topic: bool,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            autocreate_queue: true,
            autocreate_topic: true,
        }
    }
}

impl GateConfig {
    /// Load from environment.
    pub fn from_env() -> Self {
        let flag = |name: &str, default: bool| {
            std::env::var(name)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default)
        };
        Self {
            autocreate_queue: flag("MQ_AUTOCREATE_QUEUE", true),
            autocreate_topic: flag("MQ_AUTOCREATE_TOPIC", true),
        }
    }

    pub fn autocreate_allowed(&self, is_queue: bool) -> bool {
        if is_queue {
            self.autocreate_queue
        } else {
            self.autocreate_topic
        }
    }
}
