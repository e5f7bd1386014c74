//! Driving Ports (API - Inbound)

use crate::domain::TransactionInformation;
use crate::error::TxnLogResult;
use async_trait::async_trait;
use shared_types::TransactionUid;

/// Outcome of converting one transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionReport {
    pub tid: TransactionUid,
    /// `local`, `cluster` or `remote`.
    pub kind: &'static str,
    /// Sent-message entries in the record.
    pub sent: usize,
    /// Acknowledgment entries in the record.
    pub acks: usize,
    /// Messages skipped because they could not be resolved.
    pub unresolved: usize,
    /// Prepared copies removed from the store.
    pub removed: usize,
    /// Removals that failed and were only logged.
    pub failed_removals: usize,
}

impl ConversionReport {
    pub(crate) fn new(tid: TransactionUid, kind: &'static str) -> Self {
        Self {
            tid,
            kind,
            sent: 0,
            acks: 0,
            unresolved: 0,
            removed: 0,
            failed_removals: 0,
        }
    }
}

/// Transaction log conversion API.
#[async_trait]
pub trait TxnLogConversionApi: Send + Sync {
    /// Convert one prepared transaction into a durable record.
    async fn convert(&self, info: &TransactionInformation) -> TxnLogResult<ConversionReport>;

    /// Convert every transaction the broker knows of, local and cluster
    /// transactions first, then remote ones.
    async fn convert_all(&self) -> TxnLogResult<Vec<ConversionReport>>;
}
