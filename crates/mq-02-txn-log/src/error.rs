//! Error types for transaction log conversion.

use shared_types::{Status, TransactionUid};
use thiserror::Error;

/// Transaction log conversion errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TxnLogError {
    /// The store rejected the transaction record.
    #[error("Failed to log transaction {tid}: {reason}")]
    StoreWrite { tid: TransactionUid, reason: String },

    /// Store I/O outside the record write (message removal, lookups).
    #[error("Store I/O error: {0}")]
    StoreIo(String),

    /// No acknowledgment entries were recovered for a remote transaction.
    #[error("Could not find remote transaction acknowledgements for {tid}")]
    MissingRemoteAcks { tid: TransactionUid },

    /// A remote transaction has no recorded home broker.
    #[error("Could not find home broker for remote transaction {tid}")]
    MissingHomeBroker { tid: TransactionUid },

    /// A record could not be encoded or decoded.
    #[error("Transaction record encoding error: {0}")]
    Encoding(String),
}

impl TxnLogError {
    /// Reply status for the transaction subsystem.
    pub fn status(&self) -> Status {
        match self {
            TxnLogError::MissingRemoteAcks { .. } | TxnLogError::MissingHomeBroker { .. } => {
                Status::NotFound
            }
            _ => Status::Error,
        }
    }

    /// Failures that end one transaction's conversion but not a batch.
    pub fn is_per_transaction(&self) -> bool {
        matches!(
            self,
            TxnLogError::MissingRemoteAcks { .. } | TxnLogError::MissingHomeBroker { .. }
        )
    }
}

impl From<bincode::Error> for TxnLogError {
    fn from(err: bincode::Error) -> Self {
        TxnLogError::Encoding(err.to_string())
    }
}

/// Result type for transaction log operations
pub type TxnLogResult<T> = Result<T, TxnLogError>;
