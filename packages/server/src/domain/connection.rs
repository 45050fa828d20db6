//! Connection lifecycle: `Unjoined` → `Joined` → `Closed`.

use std::mem;

use super::{
    error::RelayError,
    event::{OutboundEvent, PusherChannel},
    rate_limiter::RateLimiter,
    value_object::{ConnectionId, DisplayName, PeerId, RoomId},
};

/// Identity and per-peer counters of a joined connection
#[derive(Debug, Clone)]
pub struct JoinedSession {
    pub peer_id: PeerId,
    pub room_id: RoomId,
    pub display_name: DisplayName,
    pub rate_limiter: RateLimiter,
}

#[derive(Debug, Clone)]
enum ConnectionPhase {
    Unjoined,
    Joined(JoinedSession),
    Closed,
}

/// Mutable state of one physical connection, owned by its handling task
#[derive(Debug)]
pub struct ConnectionState {
    id: ConnectionId,
    outbox: PusherChannel,
    phase: ConnectionPhase,
}

impl ConnectionState {
    pub fn new(outbox: PusherChannel) -> Self {
        Self {
            id: ConnectionId::generate(),
            outbox,
            phase: ConnectionPhase::Unjoined,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Channel to this connection's writer task
    pub fn outbox(&self) -> &PusherChannel {
        &self.outbox
    }

    pub fn is_joined(&self) -> bool {
        matches!(self.phase, ConnectionPhase::Joined(_))
    }

    pub fn is_closed(&self) -> bool {
        matches!(self.phase, ConnectionPhase::Closed)
    }

    /// Send an event to this connection only
    pub fn reply(&self, event: OutboundEvent) {
        if self.outbox.send(event).is_err() {
            tracing::debug!("Dropping reply for connection '{}': writer gone", self.id);
        }
    }

    /// The joined session, or `NotJoined` if the connection has not joined yet
    pub fn joined(&self) -> Result<&JoinedSession, RelayError> {
        match &self.phase {
            ConnectionPhase::Joined(session) => Ok(session),
            _ => Err(RelayError::NotJoined),
        }
    }

    pub fn joined_mut(&mut self) -> Option<&mut JoinedSession> {
        match &mut self.phase {
            ConnectionPhase::Joined(session) => Some(session),
            _ => None,
        }
    }

    /// Fail if a join is not allowed in the current phase
    pub fn ensure_can_join(&self) -> Result<(), RelayError> {
        match self.phase {
            ConnectionPhase::Unjoined => Ok(()),
            ConnectionPhase::Joined(_) => Err(RelayError::AlreadyJoined),
            ConnectionPhase::Closed => Err(RelayError::Internal(format!(
                "connection '{}' is closed",
                self.id
            ))),
        }
    }

    /// `Unjoined --join--> Joined`. Identity fields are write-once.
    pub fn mark_joined(&mut self, session: JoinedSession) -> Result<(), RelayError> {
        self.ensure_can_join()?;
        self.phase = ConnectionPhase::Joined(session);
        Ok(())
    }

    /// Move to `Closed`, handing back the joined session on the first call only
    pub fn close(&mut self) -> Option<JoinedSession> {
        match mem::replace(&mut self.phase, ConnectionPhase::Closed) {
            ConnectionPhase::Joined(session) => Some(session),
            ConnectionPhase::Unjoined | ConnectionPhase::Closed => None,
        }
    }
}
