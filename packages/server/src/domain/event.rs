//! Outbound events pushed to connections.
//!
//! Handlers never write to sockets directly: they push an `OutboundEvent` onto
//! the target connection's channel and the connection's writer task turns it
//! into a wire frame.

use tokio::sync::mpsc;

use super::{
    entity::ChatMessage,
    error::RelayError,
    value_object::{DisplayName, MessageId, PeerId, RoomId, Timestamp, TransactionId},
};

/// Channel feeding one connection's writer task
pub type PusherChannel = mpsc::UnboundedSender<OutboundEvent>;

/// The three relayed signaling message kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalKind {
    Offer,
    Answer,
    IceCandidate,
}

impl SignalKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalKind::Offer => "offer",
            SignalKind::Answer => "answer",
            SignalKind::IceCandidate => "ice-candidate",
        }
    }
}

/// Everything the relay can send to a client
#[derive(Debug, Clone, PartialEq)]
pub enum OutboundEvent {
    ChatHistory {
        messages: Vec<ChatMessage>,
        transaction_id: TransactionId,
    },
    UserJoined {
        peer_id: PeerId,
        display_name: DisplayName,
        timestamp: Timestamp,
        transaction_id: TransactionId,
    },
    UserLeft {
        peer_id: PeerId,
        display_name: DisplayName,
        timestamp: Timestamp,
        transaction_id: TransactionId,
    },
    JoinSuccess {
        room_id: RoomId,
        participant_count: usize,
        transaction_id: TransactionId,
    },
    Signal {
        kind: SignalKind,
        /// Opaque payload, forwarded untouched
        payload: serde_json::Value,
        from: PeerId,
        display_name: DisplayName,
        timestamp: Timestamp,
        transaction_id: TransactionId,
    },
    Chat {
        message: ChatMessage,
        transaction_id: TransactionId,
    },
    MessageAck {
        message_id: MessageId,
        timestamp: Timestamp,
        transaction_id: TransactionId,
    },
    Error {
        error: RelayError,
        transaction_id: Option<TransactionId>,
    },
}
