//! Domain layer: transaction state, work and durable records.

pub mod records;
pub mod state;
pub mod work;

pub use records::{
    ClusterTransaction, LocalTransaction, RemoteTransaction, RemoteTransactionAckEntry,
    TransactionAcknowledgement, TxnLogRecord,
};
pub use state::{TransactionBroker, TransactionInformation, TransactionKind, TransactionState};
pub use work::{PacketReference, TransactionWork, TransactionWorkMessage, TransactionWorkMessageAck};
