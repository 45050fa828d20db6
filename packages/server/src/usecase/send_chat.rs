//! UseCase: チャット送信処理
//!
//! ## 責務
//!
//! - メッセージ ID とタイムスタンプの採番
//! - ルームのチャット履歴への追加と、送信者以外へのブロードキャスト
//!   （Repository の同一クリティカルセクション内で行われる）
//! - 最後に送信者へ message-ack を返す

use std::sync::Arc;

use genkan_shared::time::Clock;

use crate::domain::{
    ChatMessage, ChatText, ConnectionState, MessageId, OutboundEvent, RelayError, RoomRepository,
    Timestamp, TransactionId,
};

/// チャット送信のユースケース
pub struct SendChatUseCase {
    /// Repository（データアクセス層の抽象化）
    repository: Arc<dyn RoomRepository>,
    /// Clock（時刻取得の抽象化）
    clock: Arc<dyn Clock>,
}

impl SendChatUseCase {
    /// 新しい SendChatUseCase を作成
    pub fn new(repository: Arc<dyn RoomRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { repository, clock }
    }

    /// チャット送信を実行
    ///
    /// # Returns
    ///
    /// * `Ok(MessageId)` - 採番されたメッセージ ID
    /// * `Err(RelayError::NotJoined)` - 未参加、または同じ peer id の別接続に置き換えられた
    pub async fn execute(
        &self,
        connection: &ConnectionState,
        text: ChatText,
        transaction_id: TransactionId,
    ) -> Result<MessageId, RelayError> {
        let sender = connection.joined()?;
        let timestamp = Timestamp::new(self.clock.now_millis());
        let message = ChatMessage {
            id: MessageId::generate(),
            from: sender.peer_id,
            display_name: sender.display_name.clone(),
            text,
            timestamp,
        };
        let message_id = message.id;

        // 1. 履歴への追加とブロードキャスト
        let recipients = self
            .repository
            .post_chat(&sender.room_id, connection.id(), message, transaction_id)
            .await?;

        // 2. 送信者への ack（最後に送る）
        connection.reply(OutboundEvent::MessageAck {
            message_id,
            timestamp,
            transaction_id,
        });

        tracing::debug!(
            "Chat '{}' from '{}' broadcast to {} peer(s) in room '{}'",
            message_id,
            sender.peer_id,
            recipients,
            sender.room_id
        );
        Ok(message_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{
            DisplayName, JoinRequest, JoinedSession, MockRoomRepository, PeerId, RateLimitPolicy,
            RateLimiter, RepositoryError, RoomId,
        },
        infrastructure::repository::InMemoryRoomRepository,
        usecase::JoinRoomUseCase,
    };
    use genkan_shared::time::FixedClock;
    use tokio::sync::mpsc;

    async fn join(
        repository: Arc<InMemoryRoomRepository>,
        name: &str,
    ) -> (ConnectionState, mpsc::UnboundedReceiver<OutboundEvent>) {
        join_as(repository, PeerId::from(uuid::Uuid::new_v4()), name).await
    }

    async fn join_as(
        repository: Arc<InMemoryRoomRepository>,
        peer_id: PeerId,
        name: &str,
    ) -> (ConnectionState, mpsc::UnboundedReceiver<OutboundEvent>) {
        let usecase = JoinRoomUseCase::new(
            repository,
            Arc::new(FixedClock::new(1_000)),
            RateLimitPolicy::default(),
        );
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut connection = ConnectionState::new(tx);
        usecase
            .execute(
                &mut connection,
                JoinRequest {
                    peer_id,
                    room_id: RoomId::new("abc".to_string()).unwrap(),
                    display_name: DisplayName::new(name.to_string()).unwrap(),
                },
                TransactionId::generate(),
            )
            .await
            .unwrap();
        while rx.try_recv().is_ok() {}
        (connection, rx)
    }

    #[tokio::test]
    async fn test_chat_is_broadcast_then_acknowledged() {
        // テスト項目: チャットが他の参加者に届き、送信者には ack が返り、履歴に 1 件追加される
        // given (前提条件):
        let repository = Arc::new(InMemoryRoomRepository::default());
        let (alice, mut alice_rx) = join(repository.clone(), "Alice").await;
        let (_bob, mut bob_rx) = join(repository.clone(), "Bob").await;
        while alice_rx.try_recv().is_ok() {}
        let usecase = SendChatUseCase::new(repository.clone(), Arc::new(FixedClock::new(5_000)));
        let transaction_id = TransactionId::generate();

        // when (操作):
        let message_id = usecase
            .execute(
                &alice,
                ChatText::new("hi".to_string()).unwrap(),
                transaction_id,
            )
            .await
            .unwrap();

        // then (期待する結果):
        match bob_rx.try_recv().unwrap() {
            OutboundEvent::Chat { message, .. } => {
                assert_eq!(message.id, message_id);
                assert_eq!(message.text.as_str(), "hi");
                assert_eq!(message.display_name.as_str(), "Alice");
            }
            other => panic!("unexpected event: {other:?}"),
        }
        assert_eq!(
            alice_rx.try_recv().unwrap(),
            OutboundEvent::MessageAck {
                message_id,
                timestamp: Timestamp::new(5_000),
                transaction_id,
            }
        );
        assert!(alice_rx.try_recv().is_err());
        let room_id = RoomId::new("abc".to_string()).unwrap();
        assert_eq!(repository.chat_history(&room_id).await.len(), 1);
    }

    #[tokio::test]
    async fn test_replaced_connection_is_not_joined() {
        // テスト項目: 同じ peer id で別の接続が参加した後、古い接続からのチャットは NotJoined になり履歴に残らない
        // given (前提条件):
        let repository = Arc::new(InMemoryRoomRepository::default());
        let (stale, mut stale_rx) = join(repository.clone(), "Alice").await;
        let peer_id = stale.joined().unwrap().peer_id;
        let (_current, mut current_rx) = join_as(repository.clone(), peer_id, "Alice").await;
        while stale_rx.try_recv().is_ok() {}
        let usecase = SendChatUseCase::new(repository.clone(), Arc::new(FixedClock::new(5_000)));

        // when (操作):
        let result = usecase
            .execute(
                &stale,
                ChatText::new("hi".to_string()).unwrap(),
                TransactionId::generate(),
            )
            .await;

        // then (期待する結果):
        assert_eq!(result, Err(RelayError::NotJoined));
        assert!(stale_rx.try_recv().is_err());
        assert!(current_rx.try_recv().is_err());
        let room_id = RoomId::new("abc".to_string()).unwrap();
        assert!(repository.chat_history(&room_id).await.is_empty());
    }

    #[tokio::test]
    async fn test_lost_membership_is_not_acknowledged() {
        // テスト項目: Repository がメンバーでないと判定した場合は NotJoined となり、ack は送られない
        // given (前提条件):
        let mut repository = MockRoomRepository::new();
        repository
            .expect_post_chat()
            .times(1)
            .returning(|room_id, _, message, _| {
                Err(RepositoryError::NotMember {
                    room_id: room_id.to_string(),
                    peer_id: message.from.to_string(),
                })
            });
        let usecase = SendChatUseCase::new(Arc::new(repository), Arc::new(FixedClock::new(0)));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut connection = ConnectionState::new(tx);
        connection
            .mark_joined(JoinedSession {
                peer_id: PeerId::from(uuid::Uuid::new_v4()),
                room_id: RoomId::new("abc".to_string()).unwrap(),
                display_name: DisplayName::default(),
                rate_limiter: RateLimiter::new(RateLimitPolicy::default(), Timestamp::new(0)),
            })
            .unwrap();

        // when (操作):
        let result = usecase
            .execute(
                &connection,
                ChatText::new("hi".to_string()).unwrap(),
                TransactionId::generate(),
            )
            .await;

        // then (期待する結果):
        assert_eq!(result, Err(RelayError::NotJoined));
        assert!(rx.try_recv().is_err());
    }
}
