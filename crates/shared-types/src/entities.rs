//! # Core Identities
//!
//! Value types naming the things the broker moves around: messages,
//! transactions, client connections and the brokers of a cluster.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{IpAddr, Ipv6Addr};

/// Address of a broker process in a cluster.
///
/// Two addresses are the same broker when host, port and broker id agree.
/// The broker id is only set in HA clusters where several processes can
/// share a host/port over time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BrokerAddress {
    /// Host name or IP literal.
    pub host: String,
    /// Cluster service port.
    pub port: u16,
    /// HA broker id, if any.
    pub broker_id: Option<String>,
}

impl BrokerAddress {
    /// Create an address without a broker id.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            broker_id: None,
        }
    }

    /// Attach an HA broker id.
    pub fn with_broker_id(mut self, broker_id: impl Into<String>) -> Self {
        self.broker_id = Some(broker_id.into());
        self
    }
}

impl fmt::Display for BrokerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.broker_id {
            Some(id) => write!(f, "mq://{}:{}/?brokerID={}", self.host, self.port, id),
            None => write!(f, "mq://{}:{}/", self.host, self.port),
        }
    }
}

/// System-wide unique message identifier.
///
/// Built by the producing broker from a per-process sequence number, the
/// broker's IP address and port, and the creation timestamp. Ordering is by
/// timestamp first so identifiers sort roughly in production order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SysMessageId {
    /// Creation time in milliseconds since the epoch.
    pub timestamp: u64,
    /// Producing broker IP (IPv4 stored as mapped IPv6).
    pub ip: [u8; 16],
    /// Producing broker port.
    pub port: u16,
    /// Per-broker sequence number.
    pub sequence: u32,
}

impl SysMessageId {
    pub fn new(sequence: u32, ip: IpAddr, port: u16, timestamp: u64) -> Self {
        let ip = match ip {
            IpAddr::V4(v4) => v4.to_ipv6_mapped().octets(),
            IpAddr::V6(v6) => v6.octets(),
        };
        Self {
            timestamp,
            ip,
            port,
            sequence,
        }
    }

    /// The producing broker IP in its canonical form.
    pub fn ip_addr(&self) -> IpAddr {
        Ipv6Addr::from(self.ip).to_canonical()
    }
}

impl fmt::Display for SysMessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ID:{}-{}-{}-{}",
            self.sequence,
            self.ip_addr(),
            self.port,
            self.timestamp
        )
    }
}

/// Broker-local transaction identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TransactionUid(pub u64);

impl fmt::Display for TransactionUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a client connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConnectionUid(pub u64);

impl fmt::Display for ConnectionUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// XA transaction branch identifier supplied by an external transaction
/// manager.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Xid {
    pub format_id: i32,
    pub global_txn_id: Vec<u8>,
    pub branch_qualifier: Vec<u8>,
}

impl Xid {
    pub fn new(format_id: i32, global_txn_id: Vec<u8>, branch_qualifier: Vec<u8>) -> Self {
        Self {
            format_id,
            global_txn_id,
            branch_qualifier,
        }
    }
}

impl fmt::Display for Xid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:", self.format_id)?;
        for b in &self.global_txn_id {
            write!(f, "{:02x}", b)?;
        }
        write!(f, ":")?;
        for b in &self.branch_qualifier {
            write!(f, "{:02x}", b)?;
        }
        Ok(())
    }
}
