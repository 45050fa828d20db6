//! Inbound frame router.
//!
//! Each frame goes through, in order: rate limiting (joined connections
//! only), the size limit, UTF-8 decoding, discriminator parsing, the join
//! precondition, schema validation and finally the matching use case. Any
//! failure is answered with an `error` frame on the same connection; none of
//! them close it.

use std::sync::Arc;

use genkan_shared::time::Clock;

use crate::{
    domain::{
        ClientCommand, ConnectionState, OutboundEvent, RateDecision, RelayError, Timestamp,
        TransactionId,
    },
    infrastructure::dto::websocket::InboundFrame,
    usecase::{JoinRoomUseCase, RelaySignalUseCase, SendChatUseCase},
};

pub struct MessageRouter {
    join_room_usecase: Arc<JoinRoomUseCase>,
    relay_signal_usecase: Arc<RelaySignalUseCase>,
    send_chat_usecase: Arc<SendChatUseCase>,
    clock: Arc<dyn Clock>,
    max_frame_bytes: usize,
}

impl MessageRouter {
    pub fn new(
        join_room_usecase: Arc<JoinRoomUseCase>,
        relay_signal_usecase: Arc<RelaySignalUseCase>,
        send_chat_usecase: Arc<SendChatUseCase>,
        clock: Arc<dyn Clock>,
        max_frame_bytes: usize,
    ) -> Self {
        Self {
            join_room_usecase,
            relay_signal_usecase,
            send_chat_usecase,
            clock,
            max_frame_bytes,
        }
    }

    /// Handle one raw frame (text or binary) from `connection`
    pub async fn handle_frame(&self, connection: &mut ConnectionState, frame: &[u8]) {
        let transaction_id = TransactionId::generate();
        if let Err(error) = self.dispatch(connection, frame, transaction_id).await {
            match &error {
                RelayError::Internal(cause) => tracing::error!(
                    "Connection '{}' failed to handle frame {}: {}",
                    connection.id(),
                    transaction_id,
                    cause
                ),
                RelayError::PeerNotFound => tracing::debug!(
                    "Connection '{}' targeted an absent peer ({})",
                    connection.id(),
                    transaction_id
                ),
                other => tracing::warn!(
                    "Connection '{}' sent a rejected frame {}: {}",
                    connection.id(),
                    transaction_id,
                    other
                ),
            }
            connection.reply(OutboundEvent::Error {
                error,
                transaction_id: Some(transaction_id),
            });
        }
    }

    async fn dispatch(
        &self,
        connection: &mut ConnectionState,
        frame: &[u8],
        transaction_id: TransactionId,
    ) -> Result<(), RelayError> {
        let now = Timestamp::new(self.clock.now_millis());
        if let Some(session) = connection.joined_mut()
            && session.rate_limiter.hit(now) == RateDecision::Limited
        {
            return Err(RelayError::RateLimited);
        }

        if frame.len() > self.max_frame_bytes {
            return Err(RelayError::PayloadTooLarge {
                size: frame.len(),
                limit: self.max_frame_bytes,
            });
        }

        let text = std::str::from_utf8(frame).map_err(|e| RelayError::Malformed(e.to_string()))?;
        let inbound = InboundFrame::parse(text)?;
        if inbound.kind.requires_join() && !connection.is_joined() {
            return Err(RelayError::NotJoined);
        }

        match ClientCommand::try_from(inbound.decode()?)? {
            ClientCommand::Join(request) => self
                .join_room_usecase
                .execute(connection, request, transaction_id)
                .await
                .map(|_| ()),
            ClientCommand::Signal(request) => {
                self.relay_signal_usecase
                    .execute(connection, request, transaction_id)
                    .await
            }
            ClientCommand::Chat(text) => self
                .send_chat_usecase
                .execute(connection, text, transaction_id)
                .await
                .map(|_| ()),
        }
    }
}
