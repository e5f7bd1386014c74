//! Domain layer: identities and the wildcard matcher.

pub mod pattern;
pub mod uid;

pub use pattern::{is_wildcard_name, WildcardPattern};
pub use uid::{match_destinations, DestinationUid};
