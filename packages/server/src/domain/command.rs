//! Validated client commands.
//!
//! Wire messages are converted into these at the boundary; handlers only ever
//! see values that already satisfy every field constraint.

use super::{
    event::SignalKind,
    value_object::{ChatText, DisplayName, PeerId, RoomId},
};

#[derive(Debug, Clone, PartialEq)]
pub struct JoinRequest {
    pub peer_id: PeerId,
    pub room_id: RoomId,
    pub display_name: DisplayName,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SignalRequest {
    pub kind: SignalKind,
    pub target: PeerId,
    pub payload: serde_json::Value,
}

/// Closed set of operations a client can request
#[derive(Debug, Clone, PartialEq)]
pub enum ClientCommand {
    Join(JoinRequest),
    Signal(SignalRequest),
    Chat(ChatText),
}
