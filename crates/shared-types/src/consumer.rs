//! # Consumer Identity
//!
//! A consumer attached to a destination is identified by a numeric id plus
//! the acknowledgment contract it was created with, the connection that owns
//! it and, for consumers living on another broker, that broker's address.
//!
//! Equality and hashing use the numeric id only, so a `ConsumerUid` can be
//! used as a map key regardless of which associations are attached.
//!
//! ## Acknowledgment modes
//!
//! | Mode | Code | Unsafe (redelivery may duplicate) |
//! |------|------|-----------------------------------|
//! | `None` | 0 | no |
//! | `Auto` | 1 | no |
//! | `Client` | 2 | no |
//! | `DupsOk` | 3 | yes |
//! | `NoAck` | 32768 | yes |

use crate::entities::{BrokerAddress, ConnectionUid};
use crate::errors::IdentityError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Acknowledgment contract of a consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum AckMode {
    /// Not yet assigned.
    #[default]
    None,
    Auto,
    Client,
    DupsOk,
    NoAck,
}

impl AckMode {
    pub fn code(self) -> i32 {
        match self {
            AckMode::None => 0,
            AckMode::Auto => 1,
            AckMode::Client => 2,
            AckMode::DupsOk => 3,
            AckMode::NoAck => 32768,
        }
    }
}

impl TryFrom<i32> for AckMode {
    type Error = IdentityError;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(AckMode::None),
            1 => Ok(AckMode::Auto),
            2 => Ok(AckMode::Client),
            3 => Ok(AckMode::DupsOk),
            32768 => Ok(AckMode::NoAck),
            other => Err(IdentityError::UnknownAckMode(other)),
        }
    }
}

impl fmt::Display for AckMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AckMode::None => "NONE",
            AckMode::Auto => "AUTO_ACKNOWLEDGE",
            AckMode::Client => "CLIENT_ACKNOWLEDGE",
            AckMode::DupsOk => "DUPS_OK_ACKNOWLEDGE",
            AckMode::NoAck => "NO_ACKNOWLEDGE",
        };
        f.write_str(name)
    }
}

/// Identity of a consumer and its acknowledgment semantics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsumerUid {
    id: u64,
    ack_mode: AckMode,
    connection: Option<ConnectionUid>,
    broker: Option<BrokerAddress>,
    should_store: bool,
}

impl ConsumerUid {
    /// Create a local consumer identity with no acknowledgment mode yet.
    pub fn new(id: u64) -> Self {
        Self {
            id,
            ack_mode: AckMode::None,
            connection: None,
            broker: None,
            should_store: false,
        }
    }

    pub fn with_connection(mut self, connection: ConnectionUid) -> Self {
        self.connection = Some(connection);
        self
    }

    /// Mark the consumer as living on a remote broker.
    pub fn with_broker(mut self, broker: BrokerAddress) -> Self {
        self.broker = Some(broker);
        self
    }

    pub fn with_should_store(mut self, should_store: bool) -> Self {
        self.should_store = should_store;
        self
    }

    /// Builder form of [`ConsumerUid::set_ack_mode`].
    pub fn with_ack_mode(mut self, mode: AckMode) -> Result<Self, IdentityError> {
        self.set_ack_mode(mode)?;
        Ok(self)
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn ack_mode(&self) -> AckMode {
        self.ack_mode
    }

    pub fn connection(&self) -> Option<ConnectionUid> {
        self.connection
    }

    pub fn broker(&self) -> Option<&BrokerAddress> {
        self.broker.as_ref()
    }

    pub fn should_store(&self) -> bool {
        self.should_store
    }

    pub fn set_should_store(&mut self, should_store: bool) {
        self.should_store = should_store;
    }

    /// Fix the acknowledgment mode.
    ///
    /// The mode can be assigned once; re-assigning the same mode is a no-op,
    /// assigning a different one fails.
    pub fn set_ack_mode(&mut self, mode: AckMode) -> Result<(), IdentityError> {
        if self.ack_mode != AckMode::None && self.ack_mode != mode {
            return Err(IdentityError::AckModeAlreadySet {
                current: self.ack_mode,
                attempted: mode,
            });
        }
        self.ack_mode = mode;
        Ok(())
    }

    pub fn is_auto_ack(&self) -> bool {
        self.ack_mode == AckMode::Auto
    }

    pub fn is_client_ack(&self) -> bool {
        self.ack_mode == AckMode::Client
    }

    pub fn is_dups_ok(&self) -> bool {
        self.ack_mode == AckMode::DupsOk
    }

    pub fn is_no_ack(&self) -> bool {
        self.ack_mode == AckMode::NoAck
    }

    /// Redelivery after a failure may hand out duplicates.
    pub fn is_unsafe_ack(&self) -> bool {
        self.is_dups_ok() || self.is_no_ack()
    }

    /// No remote broker is attached.
    pub fn is_local(&self) -> bool {
        self.broker.is_none()
    }

    /// Detach: zero the identity and drop all associations.
    pub fn clear(&mut self) {
        self.id = 0;
        self.ack_mode = AckMode::None;
        self.connection = None;
        self.broker = None;
        self.should_store = false;
    }
}

impl PartialEq for ConsumerUid {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ConsumerUid {}

impl Hash for ConsumerUid {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for ConsumerUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[consumer:{}, type={}]", self.id, self.ack_mode)
    }
}
