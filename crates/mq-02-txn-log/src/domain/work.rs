//! Per-transaction work: the messages a transaction sent and the
//! acknowledgments it made.

use mq_01_destination::DestinationUid;
use serde::{Deserialize, Serialize};
use shared_types::{ConsumerUid, SysMessageId};

/// A live message held by the broker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PacketReference {
    pub message_id: SysMessageId,
    pub destination: DestinationUid,
    /// Encoded message packet.
    pub packet: Vec<u8>,
}

impl PacketReference {
    pub fn new(message_id: SysMessageId, destination: DestinationUid, packet: Vec<u8>) -> Self {
        Self {
            message_id,
            destination,
            packet,
        }
    }
}

/// A message sent inside a transaction, with the consumers it was routed to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionWorkMessage {
    pub message: PacketReference,
    pub destination: DestinationUid,
    pub stored_interests: Vec<ConsumerUid>,
}

impl TransactionWorkMessage {
    pub fn message_id(&self) -> SysMessageId {
        self.message.message_id
    }
}

/// A message acknowledged inside a transaction.
///
/// `consumer` is the persisted consumer identity, not the transient one the
/// ack arrived on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionWorkMessageAck {
    pub destination: DestinationUid,
    pub message_id: SysMessageId,
    pub consumer: ConsumerUid,
}

/// Sent messages and acknowledgments of one transaction, in the order they
/// were collected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionWork {
    sent: Vec<TransactionWorkMessage>,
    acks: Vec<TransactionWorkMessageAck>,
}

impl TransactionWork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_message(&mut self, message: TransactionWorkMessage) {
        self.sent.push(message);
    }

    pub fn add_message_ack(&mut self, ack: TransactionWorkMessageAck) {
        self.acks.push(ack);
    }

    pub fn sent_messages(&self) -> &[TransactionWorkMessage] {
        &self.sent
    }

    pub fn message_acks(&self) -> &[TransactionWorkMessageAck] {
        &self.acks
    }

    pub fn num_sent(&self) -> usize {
        self.sent.len()
    }

    pub fn num_acks(&self) -> usize {
        self.acks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sent.is_empty() && self.acks.is_empty()
    }
}
