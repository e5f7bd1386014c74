//! # Wire Codes
//!
//! Status codes, packet types and connection lifecycle states that the
//! surrounding broker exchanges with clients.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Reply status code returned to a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    Ok,
    BadRequest,
    NotFound,
    NotAcceptable,
    Conflict,
    UnsupportedType,
    /// Transient condition; the client should re-issue the operation.
    Retry,
    Error,
    NotImplemented,
    /// Broker temporarily cannot serve the request.
    Unavailable,
}

impl Status {
    /// Numeric code carried on the wire.
    pub fn code(self) -> u16 {
        match self {
            Status::Ok => 200,
            Status::BadRequest => 400,
            Status::NotFound => 404,
            Status::NotAcceptable => 406,
            Status::Conflict => 409,
            Status::UnsupportedType => 415,
            Status::Retry => 449,
            Status::Error => 500,
            Status::NotImplemented => 501,
            Status::Unavailable => 503,
        }
    }

    /// True for outcomes a client is expected to retry later.
    pub fn is_transient(self) -> bool {
        matches!(self, Status::Retry | Status::Unavailable)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Status::Ok => "OK",
            Status::BadRequest => "BAD_REQUEST",
            Status::NotFound => "NOT_FOUND",
            Status::NotAcceptable => "NOT_ACCEPTABLE",
            Status::Conflict => "CONFLICT",
            Status::UnsupportedType => "UNSUPPORTED_TYPE",
            Status::Retry => "RETRY",
            Status::Error => "ERROR",
            Status::NotImplemented => "NOT_IMPLEMENTED",
            Status::Unavailable => "UNAVAILABLE",
        };
        write!(f, "{}({})", name, self.code())
    }
}

/// Inbound packet types relevant to the cluster-sync restriction.
///
/// Every other packet type is carried as `Other` with its raw code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PacketType {
    AddConsumer,
    AddProducer,
    CreateDestination,
    Other(u16),
}

impl PacketType {
    pub fn code(self) -> u16 {
        match self {
            PacketType::AddConsumer => 14,
            PacketType::AddProducer => 18,
            PacketType::CreateDestination => 40,
            PacketType::Other(code) => code,
        }
    }

    /// Reply packet type for a request (request code + 1).
    pub fn reply_code(self) -> u16 {
        self.code() + 1
    }
}

impl From<u16> for PacketType {
    fn from(code: u16) -> Self {
        match code {
            14 => PacketType::AddConsumer,
            18 => PacketType::AddProducer,
            40 => PacketType::CreateDestination,
            other => PacketType::Other(other),
        }
    }
}

/// Client protocol version that introduced the "wait for master broker"
/// reply. Older clients cannot be parked and are refused outright.
pub const MQ450_PROTOCOL: u32 = 450;

/// Lifecycle of a client connection, in the order a connection moves
/// through it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ConnectionState {
    Unavailable,
    Connected,
    Initialized,
    AuthRequested,
    AuthResponded,
    Authenticated,
    Cleaned,
    Closed,
    Destroying,
    Destroyed,
}

impl ConnectionState {
    /// True once the connection reached `Closed` or anything after it.
    pub fn is_closed(self) -> bool {
        self >= ConnectionState::Closed
    }
}
