//! Error types for the signaling relay domain.

use thiserror::Error;

/// Errors raised while constructing value objects from client input
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueObjectError {
    /// Peer id is not a well-formed UUID
    #[error("peer id '{0}' is not a valid UUID")]
    InvalidPeerId(String),

    /// Room id length is out of range
    #[error("room id must be between {min} and {max} characters (got {actual})")]
    RoomIdLength {
        actual: usize,
        min: usize,
        max: usize,
    },

    /// Display name is too long
    #[error("display name must be at most {max} characters (got {actual})")]
    DisplayNameTooLong { actual: usize, max: usize },

    /// Chat text is too long
    #[error("chat message must be at most {max} characters (got {actual})")]
    ChatTextTooLong { actual: usize, max: usize },
}

/// Errors raised by the room registry
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    /// The sender no longer holds a session in the room under its connection,
    /// either because the room is gone or because a newer connection took over
    /// its peer id
    #[error("peer '{peer_id}' holds no session in room '{room_id}'")]
    NotMember { room_id: String, peer_id: String },
}

/// Which inbound schema a validation failure belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationContext {
    Join,
    Signaling,
    Chat,
}

impl ValidationContext {
    /// Client-facing summary for a validation failure in this context
    pub fn message(&self) -> &'static str {
        match self {
            ValidationContext::Join => "Invalid join data",
            ValidationContext::Signaling => "Invalid signaling data",
            ValidationContext::Chat => "Invalid chat message",
        }
    }
}

/// Errors reported back to a client as an `error` frame.
///
/// None of these close the connection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RelayError {
    /// A field is missing, malformed or out of range
    #[error("{}: {details}", .context.message())]
    Validation {
        context: ValidationContext,
        details: String,
    },

    /// The frame is not a JSON object
    #[error("Malformed message: {0}")]
    Malformed(String),

    /// The `type` discriminator is missing or unrecognized
    #[error("Unknown message type: {0}")]
    UnknownType(String),

    /// Signaling or chat attempted before a successful join
    #[error("Not joined to a room")]
    NotJoined,

    /// A second join on an already joined connection
    #[error("Already joined to a room")]
    AlreadyJoined,

    /// Relay target is not in the sender's room
    #[error("Target peer not found")]
    PeerNotFound,

    /// Raw frame exceeds the size limit
    #[error("Message too large ({size} bytes, limit {limit})")]
    PayloadTooLarge { size: usize, limit: usize },

    /// Too many messages inside the rate window
    #[error("Rate limit exceeded, please slow down")]
    RateLimited,

    /// Unexpected failure while handling a frame
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl RelayError {
    /// Status-like code carried in the `error` frame
    pub fn code(&self) -> u16 {
        match self {
            RelayError::Validation { .. }
            | RelayError::Malformed(_)
            | RelayError::UnknownType(_)
            | RelayError::NotJoined
            | RelayError::AlreadyJoined => 400,
            RelayError::PeerNotFound => 404,
            RelayError::PayloadTooLarge { .. } => 413,
            RelayError::RateLimited => 429,
            RelayError::Internal(_) => 500,
        }
    }

    /// Human-readable message carried in the `error` frame
    pub fn client_message(&self) -> &'static str {
        match self {
            RelayError::Validation { context, .. } => context.message(),
            RelayError::Malformed(_) => "Malformed message",
            RelayError::UnknownType(_) => "Unknown message type",
            RelayError::NotJoined => "Not joined to a room",
            RelayError::AlreadyJoined => "Already joined to a room",
            RelayError::PeerNotFound => "Target peer not found",
            RelayError::PayloadTooLarge { .. } => "Message too large",
            RelayError::RateLimited => "Rate limit exceeded, please slow down",
            RelayError::Internal(_) => "Internal server error",
        }
    }

    /// Optional details carried in the `error` frame.
    ///
    /// Internal failures never leak their cause to the client.
    pub fn details(&self) -> Option<String> {
        match self {
            RelayError::Validation { details, .. } => Some(details.clone()),
            RelayError::Malformed(reason) => Some(reason.clone()),
            RelayError::UnknownType(kind) => Some(kind.clone()),
            RelayError::PayloadTooLarge { size, limit } => {
                Some(format!("{size} bytes exceeds the {limit} byte limit"))
            }
            _ => None,
        }
    }

    pub(crate) fn validation(context: ValidationContext, source: impl ToString) -> Self {
        RelayError::Validation {
            context,
            details: source.to_string(),
        }
    }
}

impl From<RepositoryError> for RelayError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::NotMember { .. } => RelayError::NotJoined,
        }
    }
}
