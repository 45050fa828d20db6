//! Domain entities: chat messages, peer sessions and rooms.
//!
//! A `Room` performs its own fan-out. Each operation mutates the room and
//! pushes every resulting event before returning, so whoever holds the room
//! exclusively observes join, leave and chat as single steps.

use super::{
    chat_log::ChatLog,
    event::{OutboundEvent, PusherChannel},
    value_object::{
        ChatText, ConnectionId, DisplayName, MessageId, PeerId, RoomId, Timestamp, TransactionId,
    },
};

/// Immutable chat record stored in a room's log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub id: MessageId,
    pub from: PeerId,
    pub display_name: DisplayName,
    pub text: ChatText,
    pub timestamp: Timestamp,
}

/// Server-side state of one joined participant
#[derive(Debug, Clone)]
pub struct PeerSession {
    pub id: PeerId,
    pub display_name: DisplayName,
    /// Connection that owns this session
    pub connection_id: ConnectionId,
    pub joined_at: Timestamp,
    channel: PusherChannel,
}

impl PeerSession {
    pub fn new(
        id: PeerId,
        display_name: DisplayName,
        connection_id: ConnectionId,
        joined_at: Timestamp,
        channel: PusherChannel,
    ) -> Self {
        Self {
            id,
            display_name,
            connection_id,
            joined_at,
            channel,
        }
    }

    /// Queue an event for this peer's connection.
    ///
    /// A closed channel means the connection is already tearing down; its own
    /// close path removes the session, so the failure is only logged.
    pub fn push(&self, event: OutboundEvent) {
        if self.channel.send(event).is_err() {
            tracing::warn!("Failed to push event to peer '{}': channel closed", self.id);
        }
    }
}

/// What a successful admission looked like
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Admission {
    pub participant_count: usize,
    /// Whether an older session under the same peer id was replaced
    pub replaced: bool,
}

/// Named group of peers sharing discovery and chat
#[derive(Debug, Clone)]
pub struct Room {
    pub id: RoomId,
    pub created_at: Timestamp,
    /// Insertion-ordered peers; ids are unique within the room
    peers: Vec<PeerSession>,
    chat_log: ChatLog,
}

impl Room {
    pub fn new(id: RoomId, created_at: Timestamp, chat_log: ChatLog) -> Self {
        Self {
            id,
            created_at,
            peers: Vec::new(),
            chat_log,
        }
    }

    pub fn participant_count(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    pub fn peer(&self, peer_id: &PeerId) -> Option<&PeerSession> {
        self.peers.iter().find(|p| &p.id == peer_id)
    }

    /// Whether `peer_id` is present and its session belongs to `connection_id`
    pub fn is_held_by(&self, peer_id: &PeerId, connection_id: ConnectionId) -> bool {
        self.peer(peer_id)
            .is_some_and(|p| p.connection_id == connection_id)
    }

    pub fn chat_log(&self) -> &ChatLog {
        &self.chat_log
    }

    /// Insert a peer and run the join handshake.
    ///
    /// The newcomer receives the recent history (if any), one `user-joined`
    /// per existing peer and finally `join-success`; every existing peer
    /// receives one `user-joined` about the newcomer. A stale session under
    /// the same peer id is replaced in place.
    pub fn admit(
        &mut self,
        session: PeerSession,
        history_replay: usize,
        transaction_id: TransactionId,
    ) -> Admission {
        let timestamp = session.joined_at;
        let newcomer_id = session.id;
        let (index, replaced) = match self.peers.iter().position(|p| p.id == newcomer_id) {
            Some(index) => {
                self.peers[index] = session;
                (index, true)
            }
            None => {
                self.peers.push(session);
                (self.peers.len() - 1, false)
            }
        };
        let newcomer = &self.peers[index];

        if history_replay > 0 && !self.chat_log.is_empty() {
            newcomer.push(OutboundEvent::ChatHistory {
                messages: self.chat_log.recent(history_replay),
                transaction_id,
            });
        }

        for peer in self.peers.iter().filter(|p| p.id != newcomer_id) {
            peer.push(OutboundEvent::UserJoined {
                peer_id: newcomer.id,
                display_name: newcomer.display_name.clone(),
                timestamp,
                transaction_id,
            });
            newcomer.push(OutboundEvent::UserJoined {
                peer_id: peer.id,
                display_name: peer.display_name.clone(),
                timestamp,
                transaction_id,
            });
        }

        let participant_count = self.peers.len();
        newcomer.push(OutboundEvent::JoinSuccess {
            room_id: self.id.clone(),
            participant_count,
            transaction_id,
        });

        Admission {
            participant_count,
            replaced,
        }
    }

    /// Remove the session owned by `connection_id` and tell the remaining peers.
    ///
    /// Returns `None` when the peer is absent or its entry now belongs to a
    /// newer connection.
    pub fn depart(
        &mut self,
        peer_id: &PeerId,
        connection_id: ConnectionId,
        timestamp: Timestamp,
        transaction_id: TransactionId,
    ) -> Option<PeerSession> {
        let index = self
            .peers
            .iter()
            .position(|p| &p.id == peer_id && p.connection_id == connection_id)?;
        let departed = self.peers.remove(index);

        for peer in &self.peers {
            peer.push(OutboundEvent::UserLeft {
                peer_id: departed.id,
                display_name: departed.display_name.clone(),
                timestamp,
                transaction_id,
            });
        }

        Some(departed)
    }

    /// Deliver a signaling event to `target` only. Returns `false` if absent.
    pub fn forward_to(&self, target: &PeerId, event: OutboundEvent) -> bool {
        match self.peer(target) {
            Some(peer) => {
                peer.push(event);
                true
            }
            None => false,
        }
    }

    /// Append a chat message and broadcast it to everyone except its sender.
    ///
    /// Returns the number of recipients.
    pub fn post_chat(&mut self, message: ChatMessage, transaction_id: TransactionId) -> usize {
        self.chat_log.push(message.clone());

        let mut recipients = 0;
        for peer in self.peers.iter().filter(|p| p.id != message.from) {
            peer.push(OutboundEvent::Chat {
                message: message.clone(),
                transaction_id,
            });
            recipients += 1;
        }
        recipients
    }
}
