//! Conversions between wire DTOs and domain types.

use crate::domain::{
    ChatMessage, ChatText, ClientCommand, DisplayName, JoinRequest, OutboundEvent, PeerId,
    RelayError, RoomId, SignalKind, SignalRequest, ValidationContext, ValueObjectError,
};

use super::websocket::{
    ChatEntry, ClientMessage, JoinPayload, RelayedSignal, ServerMessage, SignalPayload,
};

// ========================================
// Wire → Domain
// ========================================

impl TryFrom<JoinPayload> for JoinRequest {
    type Error = RelayError;

    fn try_from(payload: JoinPayload) -> Result<Self, Self::Error> {
        let invalid = |e: ValueObjectError| RelayError::validation(ValidationContext::Join, e);
        Ok(JoinRequest {
            peer_id: PeerId::parse(&payload.user_id).map_err(invalid)?,
            room_id: RoomId::new(payload.room_id).map_err(invalid)?,
            display_name: DisplayName::or_default(payload.display_name).map_err(invalid)?,
        })
    }
}

fn signal_request(kind: SignalKind, payload: SignalPayload) -> Result<SignalRequest, RelayError> {
    let target = PeerId::parse(&payload.target)
        .map_err(|e| RelayError::validation(ValidationContext::Signaling, e))?;
    Ok(SignalRequest {
        kind,
        target,
        payload: payload.data,
    })
}

impl TryFrom<ClientMessage> for ClientCommand {
    type Error = RelayError;

    fn try_from(message: ClientMessage) -> Result<Self, Self::Error> {
        match message {
            ClientMessage::Join(payload) => Ok(ClientCommand::Join(payload.try_into()?)),
            ClientMessage::Offer(payload) => {
                signal_request(SignalKind::Offer, payload).map(ClientCommand::Signal)
            }
            ClientMessage::Answer(payload) => {
                signal_request(SignalKind::Answer, payload).map(ClientCommand::Signal)
            }
            ClientMessage::IceCandidate(payload) => {
                signal_request(SignalKind::IceCandidate, payload).map(ClientCommand::Signal)
            }
            ClientMessage::ChatMessage(payload) => ChatText::new(payload.data)
                .map(ClientCommand::Chat)
                .map_err(|e| RelayError::validation(ValidationContext::Chat, e)),
        }
    }
}

// ========================================
// Domain → Wire
// ========================================

impl From<ChatMessage> for ChatEntry {
    fn from(message: ChatMessage) -> Self {
        ChatEntry {
            id: message.id.to_string(),
            from: message.from.to_string(),
            display_name: message.display_name.into_string(),
            text: message.text.into_string(),
            time: message.timestamp.value(),
        }
    }
}

impl From<OutboundEvent> for ServerMessage {
    fn from(event: OutboundEvent) -> Self {
        match event {
            OutboundEvent::ChatHistory {
                messages,
                transaction_id,
            } => ServerMessage::ChatHistory {
                messages: messages.into_iter().map(ChatEntry::from).collect(),
                transaction_id: transaction_id.to_string(),
            },
            OutboundEvent::UserJoined {
                peer_id,
                display_name,
                timestamp,
                transaction_id,
            } => ServerMessage::UserJoined {
                user_id: peer_id.to_string(),
                display_name: display_name.into_string(),
                timestamp: timestamp.value(),
                transaction_id: transaction_id.to_string(),
            },
            OutboundEvent::UserLeft {
                peer_id,
                display_name,
                timestamp,
                transaction_id,
            } => ServerMessage::UserLeft {
                user_id: peer_id.to_string(),
                display_name: display_name.into_string(),
                timestamp: timestamp.value(),
                transaction_id: transaction_id.to_string(),
            },
            OutboundEvent::JoinSuccess {
                room_id,
                participant_count,
                transaction_id,
            } => ServerMessage::JoinSuccess {
                room_id: room_id.into_string(),
                participant_count,
                transaction_id: transaction_id.to_string(),
            },
            OutboundEvent::Signal {
                kind,
                payload,
                from,
                display_name,
                timestamp,
                transaction_id,
            } => {
                let signal = RelayedSignal {
                    data: payload,
                    from: from.to_string(),
                    display_name: display_name.into_string(),
                    timestamp: timestamp.value(),
                    transaction_id: transaction_id.to_string(),
                };
                match kind {
                    SignalKind::Offer => ServerMessage::Offer(signal),
                    SignalKind::Answer => ServerMessage::Answer(signal),
                    SignalKind::IceCandidate => ServerMessage::IceCandidate(signal),
                }
            }
            OutboundEvent::Chat {
                message,
                transaction_id,
            } => {
                let entry = ChatEntry::from(message);
                ServerMessage::ChatMessage {
                    id: entry.id,
                    from: entry.from,
                    display_name: entry.display_name,
                    text: entry.text,
                    time: entry.time,
                    transaction_id: transaction_id.to_string(),
                }
            }
            OutboundEvent::MessageAck {
                message_id,
                timestamp,
                transaction_id,
            } => ServerMessage::MessageAck {
                id: message_id.to_string(),
                timestamp: timestamp.value(),
                transaction_id: transaction_id.to_string(),
            },
            OutboundEvent::Error {
                error,
                transaction_id,
            } => ServerMessage::Error {
                code: error.code(),
                message: error.client_message().to_string(),
                details: error.details(),
                transaction_id: transaction_id.map(|id| id.to_string()),
            },
        }
    }
}
