//! Driving Ports (API - Inbound)

use crate::domain::DestinationUid;
use crate::error::DestinationResult;

/// Lookup and interning of destination identities.
pub trait DestinationResolver: Send + Sync {
    /// Return the interned identity for `name`, creating it on first use.
    ///
    /// Fails with `UnsupportedAddressing` when a queue name carries a
    /// wildcard, and with `MalformedWildcard` for invalid topic syntax.
    fn get_uid(&self, name: &str, is_queue: bool) -> DestinationResult<DestinationUid>;

    /// Whether a live identity for `name` is currently interned.
    fn contains(&self, name: &str, is_queue: bool) -> bool;

    /// Evict `name` on destination deletion.
    fn clear_uid(&self, name: &str, is_queue: bool);
}
