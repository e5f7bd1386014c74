//! # mq-02-txn-log
//!
//! Transaction log conversion: when a transaction reaches PREPARED, its
//! in-memory state is turned into a durable record the store can replay
//! after a crash.
//!
//! ## Overview
//!
//! | Kind | Record payload |
//! |------|----------------|
//! | Local | transaction id, xid, `TransactionWork` |
//! | Cluster | as local, plus the participating brokers |
//! | Remote | flattened acknowledgments, per-ack destinations, home broker |
//!
//! ## Architecture
//!
//! ```text
//! TransactionList ──┐
//!                   ├──→ TxnLogConverter ──log_txn──→ TxnLogStore
//! MessageLookup ────┘          │
//!                              └──remove_message (best effort)──→ TxnLogStore
//! ```
//!
//! ## Failure handling
//!
//! | Condition | Effect |
//! |-----------|--------|
//! | message no longer live | warning, entry skipped |
//! | remote transaction without acks | error, no record written |
//! | store write fails | error returned to caller |
//! | prepared copy removal fails | error logged, record kept |
//!
//! ## Example
//!
//! ```rust,ignore
//! use mq_02_txn_log::{ConverterConfig, TxnLogConverter, TxnLogConversionApi};
//!
//! let converter = TxnLogConverter::new(ConverterConfig::from_env(), store, messages, txn_list);
//! let reports = converter.convert_all().await?;
//! ```

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod adapters;
pub mod domain;
pub mod error;
pub mod metrics;
pub mod ports;
pub mod service;

pub use domain::{
    ClusterTransaction, LocalTransaction, PacketReference, RemoteTransaction,
    RemoteTransactionAckEntry, TransactionAcknowledgement, TransactionBroker,
    TransactionInformation, TransactionKind, TransactionState, TransactionWork,
    TransactionWorkMessage, TransactionWorkMessageAck, TxnLogRecord,
};
pub use error::{TxnLogError, TxnLogResult};
pub use ports::{ConversionReport, MessageLookup, TransactionList, TxnLogConversionApi, TxnLogStore};
pub use service::{ConverterConfig, TxnLogConverter};
