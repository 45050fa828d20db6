//! Domain layer: value objects, entities, lifecycle and the registry contract.

pub mod chat_log;
pub mod command;
pub mod connection;
pub mod entity;
pub mod error;
pub mod event;
pub mod rate_limiter;
pub mod repository;
pub mod value_object;

pub use chat_log::{ChatLog, DEFAULT_CHAT_CAPACITY};
pub use command::{ClientCommand, JoinRequest, SignalRequest};
pub use connection::{ConnectionState, JoinedSession};
pub use entity::{Admission, ChatMessage, PeerSession, Room};
pub use error::{RelayError, RepositoryError, ValidationContext, ValueObjectError};
pub use event::{OutboundEvent, PusherChannel, SignalKind};
pub use rate_limiter::{RateDecision, RateLimitPolicy, RateLimiter};
pub use repository::{LeaveOutcome, RoomRepository, RoomSnapshot};
pub use value_object::{
    ChatText, ConnectionId, DisplayName, MessageId, PeerId, RoomId, Timestamp, TransactionId,
};

#[cfg(test)]
pub use repository::MockRoomRepository;
