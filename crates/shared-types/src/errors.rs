//! # Error Types
//!
//! Errors raised while building shared identities.

use crate::consumer::AckMode;
use thiserror::Error;

/// Invalid identity construction or mutation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    /// Raw acknowledgment code outside the supported set.
    #[error("Unknown acknowledgment mode code: {0}")]
    UnknownAckMode(i32),

    /// A consumer's acknowledgment mode was already fixed.
    #[error("Acknowledgment mode already set to {current} (attempted {attempted})")]
    AckModeAlreadySet { current: AckMode, attempted: AckMode },
}
