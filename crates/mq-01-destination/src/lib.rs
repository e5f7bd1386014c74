//! # mq-01-destination
//!
//! Destination addressing for the broker: queue and topic identities,
//! wildcard topic matching and the intern registry.
//!
//! ## Overview
//!
//! - **Identity**: a `DestinationUid` is `(kind, name)`; its key is
//!   `Q:<name>` or `T:<name>`.
//! - **Wildcards**: topic names may contain `*`, `**` and `>`; queues may
//!   not. A wildcard identity is compared to a concrete one with
//!   [`match_destinations`], never with `==`.
//! - **Registry**: [`DestinationRegistry`] interns identities behind weak
//!   references and is owned by the destination manager, not by a global.
//!
//! ## Wildcard syntax
//!
//! | Name | Matches | Does not match |
//! |------|---------|----------------|
//! | `a.*.c` | `a.b.c` | `a.b.d`, `a.c` |
//! | `a.>` | `a`, `a.b`, `a.b.c` | `ab` |
//! | `a.**.c` | `a.anything.with.dots.c` | `a.c` |
//! | `>` | every name | |
//!
//! ## Example
//!
//! ```rust,ignore
//! use mq_01_destination::{DestinationRegistry, DestinationResolver, match_destinations};
//!
//! let registry = DestinationRegistry::new();
//! let wild = registry.get_uid("orders.>", false)?;
//! let concrete = registry.get_uid("orders.eu.paris", false)?;
//! assert!(match_destinations(&wild, &concrete)?);
//! ```

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod domain;
pub mod error;
pub mod ports;
pub mod service;

pub use domain::{is_wildcard_name, match_destinations, DestinationUid, WildcardPattern};
pub use error::{DestinationError, DestinationResult};
pub use ports::DestinationResolver;
pub use service::DestinationRegistry;
