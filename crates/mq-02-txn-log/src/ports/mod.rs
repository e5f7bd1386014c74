//! Ports for transaction log conversion.

pub mod inbound;
pub mod outbound;

pub use inbound::{ConversionReport, TxnLogConversionApi};
pub use outbound::{MessageLookup, TransactionList, TxnLogStore};
