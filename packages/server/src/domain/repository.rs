//! Room registry trait.
//!
//! The registry is the only owner of rooms. Each operation runs its mutation
//! and the resulting fan-out as one step, so concurrent callers never observe
//! a half-applied join, leave or chat.

use async_trait::async_trait;

use super::{
    entity::{ChatMessage, PeerSession},
    error::RepositoryError,
    event::OutboundEvent,
    value_object::{ConnectionId, PeerId, RoomId, Timestamp, TransactionId},
};

/// Read-only view of a room for the HTTP surface
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomSnapshot {
    pub id: RoomId,
    pub created_at: Timestamp,
    pub participants: usize,
    pub message_count: usize,
}

/// Result of removing a peer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaveOutcome {
    Left { remaining: usize, room_removed: bool },
    /// The peer was not registered under this connection
    NotPresent,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RoomRepository: Send + Sync {
    /// Get-or-create the room and admit the session (history, introductions, ack).
    /// Returns the participant count after insertion.
    async fn join(
        &self,
        room_id: RoomId,
        session: PeerSession,
        transaction_id: TransactionId,
    ) -> Result<usize, RepositoryError>;

    /// Remove the peer owned by `connection_id`, notify the rest, drop the room if empty
    async fn leave(
        &self,
        room_id: &RoomId,
        peer_id: &PeerId,
        connection_id: ConnectionId,
        timestamp: Timestamp,
        transaction_id: TransactionId,
    ) -> Result<LeaveOutcome, RepositoryError>;

    /// Deliver `event` to `target` inside `room_id`. `Ok(false)` when the target is absent.
    ///
    /// Fails with `NotMember` unless `sender` still holds its session in the
    /// room under `connection_id`.
    async fn forward_signal(
        &self,
        room_id: &RoomId,
        sender: &PeerId,
        connection_id: ConnectionId,
        target: &PeerId,
        event: OutboundEvent,
    ) -> Result<bool, RepositoryError>;

    /// Append to the room's chat log and broadcast to everyone but the sender.
    /// Returns the number of recipients.
    ///
    /// Fails with `NotMember` unless the message's sender still holds its
    /// session in the room under `connection_id`.
    async fn post_chat(
        &self,
        room_id: &RoomId,
        connection_id: ConnectionId,
        message: ChatMessage,
        transaction_id: TransactionId,
    ) -> Result<usize, RepositoryError>;

    async fn count_rooms(&self) -> usize;

    /// Snapshots of every room, ordered by room id
    async fn room_snapshots(&self) -> Vec<RoomSnapshot>;
}
