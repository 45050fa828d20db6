//! WebSocket message DTOs.
//!
//! Inbound frames are a tagged union on `type` with exactly five variants.
//! Parsing happens in two steps so that an unknown `type` and a malformed
//! known `type` produce different errors, and so the join precondition can be
//! checked before the per-type schema.

use serde::{Deserialize, Serialize};

use crate::domain::{RelayError, ValidationContext};

// ========================================
// Client → Server
// ========================================

/// Discriminator of an inbound frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientMessageKind {
    Join,
    Offer,
    Answer,
    IceCandidate,
    ChatMessage,
}

impl ClientMessageKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "join" => Some(Self::Join),
            "offer" => Some(Self::Offer),
            "answer" => Some(Self::Answer),
            "ice-candidate" => Some(Self::IceCandidate),
            "chat-message" => Some(Self::ChatMessage),
            _ => None,
        }
    }

    /// Everything except `join` needs a joined connection
    pub fn requires_join(&self) -> bool {
        !matches!(self, Self::Join)
    }

    pub fn validation_context(&self) -> ValidationContext {
        match self {
            Self::Join => ValidationContext::Join,
            Self::Offer | Self::Answer | Self::IceCandidate => ValidationContext::Signaling,
            Self::ChatMessage => ValidationContext::Chat,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinPayload {
    #[serde(alias = "peerId")]
    pub user_id: String,
    pub room_id: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SignalPayload {
    pub target: String,
    /// Opaque session description or candidate; never inspected
    #[serde(default)]
    pub data: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChatPayload {
    pub data: String,
}

/// Schema-checked inbound frame
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ClientMessage {
    Join(JoinPayload),
    Offer(SignalPayload),
    Answer(SignalPayload),
    IceCandidate(SignalPayload),
    ChatMessage(ChatPayload),
}

/// A JSON object whose `type` is one of the known variants
#[derive(Debug, Clone)]
pub struct InboundFrame {
    pub kind: ClientMessageKind,
    value: serde_json::Value,
}

impl InboundFrame {
    /// Parse raw text and read its discriminator
    pub fn parse(text: &str) -> Result<Self, RelayError> {
        let value: serde_json::Value =
            serde_json::from_str(text).map_err(|e| RelayError::Malformed(e.to_string()))?;
        let Some(object) = value.as_object() else {
            return Err(RelayError::Malformed(
                "expected a JSON object".to_string(),
            ));
        };

        let kind = match object.get("type") {
            Some(serde_json::Value::String(kind)) => ClientMessageKind::parse(kind)
                .ok_or_else(|| RelayError::UnknownType(kind.clone()))?,
            Some(other) => return Err(RelayError::UnknownType(other.to_string())),
            None => return Err(RelayError::UnknownType("<missing>".to_string())),
        };

        Ok(Self { kind, value })
    }

    /// Check the per-type schema
    pub fn decode(self) -> Result<ClientMessage, RelayError> {
        let context = self.kind.validation_context();
        serde_json::from_value(self.value).map_err(|e| RelayError::validation(context, e))
    }
}

// ========================================
// Server → Client
// ========================================

/// Chat record as sent in `chat-history`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatEntry {
    pub id: String,
    pub from: String,
    pub display_name: String,
    pub text: String,
    pub time: i64,
}

/// Relayed offer / answer / ice-candidate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayedSignal {
    pub data: serde_json::Value,
    pub from: String,
    pub display_name: String,
    pub timestamp: i64,
    pub transaction_id: String,
}

/// Every frame the server sends
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ServerMessage {
    ChatHistory {
        messages: Vec<ChatEntry>,
        transaction_id: String,
    },
    UserJoined {
        user_id: String,
        display_name: String,
        timestamp: i64,
        transaction_id: String,
    },
    UserLeft {
        user_id: String,
        display_name: String,
        timestamp: i64,
        transaction_id: String,
    },
    JoinSuccess {
        room_id: String,
        participant_count: usize,
        transaction_id: String,
    },
    Offer(RelayedSignal),
    Answer(RelayedSignal),
    IceCandidate(RelayedSignal),
    ChatMessage {
        id: String,
        from: String,
        display_name: String,
        text: String,
        time: i64,
        transaction_id: String,
    },
    MessageAck {
        id: String,
        timestamp: i64,
        transaction_id: String,
    },
    Error {
        code: u16,
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        details: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        transaction_id: Option<String>,
    },
}
