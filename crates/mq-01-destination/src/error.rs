//! Error types for the destination subsystem.
//!
//! Addressing errors are always fatal to the operation that raised them and
//! are surfaced to the client synchronously.

use shared_types::Status;
use thiserror::Error;

/// Destination addressing errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DestinationError {
    /// Queues cannot be addressed with wildcard characters.
    #[error("Wildcards are not supported for queues: {name}")]
    UnsupportedAddressing { name: String },

    /// Wildcard syntax rejected by the pattern compiler.
    #[error("Malformed wildcard destination {name}: {reason}")]
    MalformedWildcard { name: String, reason: &'static str },

    /// Both sides of a match were wildcard identities.
    #[error("Can not compare two wildcards: {left} -> {right}")]
    InvalidComparison { left: String, right: String },

    /// A persisted identity key could not be parsed.
    #[error("Invalid destination key: {0}")]
    InvalidKey(String),
}

impl DestinationError {
    /// Reply status for the client.
    pub fn status(&self) -> Status {
        match self {
            DestinationError::UnsupportedAddressing { .. } => Status::UnsupportedType,
            DestinationError::MalformedWildcard { .. } => Status::NotAcceptable,
            DestinationError::InvalidComparison { .. } => Status::Error,
            DestinationError::InvalidKey(_) => Status::BadRequest,
        }
    }
}

/// Result type for destination operations
pub type DestinationResult<T> = Result<T, DestinationError>;
