//! # Shared Types Crate
//!
//! Identities and wire-level codes shared by every broker subsystem.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: message, transaction, connection and
//!   consumer identities are defined here and nowhere else.
//! - **Identity by value**: every identity is a plain value type that is
//!   cheap to clone and safe to use as a map key.
//! - **Codes at the edge**: `Status` and `PacketType` carry the numeric codes
//!   the surrounding broker puts on the wire, so subsystems never hard-code
//!   them.
//!
//! ## Contents
//!
//! | Module | Types |
//! |--------|-------|
//! | `entities` | `BrokerAddress`, `SysMessageId`, `TransactionUid`, `ConnectionUid`, `Xid` |
//! | `consumer` | `ConsumerUid`, `AckMode` |
//! | `status` | `Status`, `PacketType`, `ConnectionState`, protocol versions |
//! | `errors` | `IdentityError` |

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod consumer;
pub mod entities;
pub mod errors;
pub mod status;

pub use consumer::{AckMode, ConsumerUid};
pub use entities::*;
pub use errors::*;
pub use status::*;
