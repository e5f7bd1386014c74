//! Adapters for the cluster-sync ports.

pub mod memory;

pub use memory::{
    InMemoryConnection, InMemoryDestinationDirectory, InMemoryService, RecordingReporter,
    SentError,
};
