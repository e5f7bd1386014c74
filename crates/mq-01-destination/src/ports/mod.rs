//! Ports for the destination subsystem.
//!
//! The registry is consumed by other subsystems (cluster-sync uses it to
//! decide whether a CREATE_DESTINATION would auto-create) through the
//! inbound port only.

pub mod inbound;

pub use inbound::DestinationResolver;
