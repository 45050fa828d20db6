//! UseCase: シグナリング中継処理
//!
//! offer / answer / ice-candidate を送信者と同じルーム内の宛先にだけ転送する。
//! ペイロードは解釈しない。宛先が見つからない場合は送信者にのみ 404 を返し、
//! メッセージは破棄される（キューイングや再送はしない）。

use std::sync::Arc;

use genkan_shared::time::Clock;

use crate::domain::{
    ConnectionState, OutboundEvent, RelayError, RoomRepository, SignalRequest, Timestamp,
    TransactionId,
};

/// シグナリング中継のユースケース
pub struct RelaySignalUseCase {
    /// Repository（データアクセス層の抽象化）
    repository: Arc<dyn RoomRepository>,
    /// Clock（時刻取得の抽象化）
    clock: Arc<dyn Clock>,
}

impl RelaySignalUseCase {
    /// 新しい RelaySignalUseCase を作成
    pub fn new(repository: Arc<dyn RoomRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { repository, clock }
    }

    /// シグナリングメッセージを宛先に転送
    ///
    /// # Returns
    ///
    /// * `Ok(())` - 宛先に転送できた
    /// * `Err(RelayError::NotJoined)` - 送信者が未参加、または同じ peer id の別接続に置き換えられた
    /// * `Err(RelayError::PeerNotFound)` - 宛先が送信者のルームにいない
    pub async fn execute(
        &self,
        connection: &ConnectionState,
        request: SignalRequest,
        transaction_id: TransactionId,
    ) -> Result<(), RelayError> {
        let sender = connection.joined()?;

        let event = OutboundEvent::Signal {
            kind: request.kind,
            payload: request.payload,
            from: sender.peer_id,
            display_name: sender.display_name.clone(),
            timestamp: Timestamp::new(self.clock.now_millis()),
            transaction_id,
        };

        let delivered = self
            .repository
            .forward_signal(
                &sender.room_id,
                &sender.peer_id,
                connection.id(),
                &request.target,
                event,
            )
            .await?;
        if !delivered {
            return Err(RelayError::PeerNotFound);
        }

        tracing::debug!(
            "Relayed {} from '{}' to '{}' in room '{}'",
            request.kind.as_str(),
            sender.peer_id,
            request.target,
            sender.room_id
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{
            DisplayName, JoinRequest, PeerId, RateLimitPolicy, RoomId, SignalKind,
        },
        infrastructure::repository::InMemoryRoomRepository,
        usecase::JoinRoomUseCase,
    };
    use genkan_shared::time::FixedClock;
    use tokio::sync::mpsc;

    struct Joined {
        connection: ConnectionState,
        peer_id: PeerId,
        rx: mpsc::UnboundedReceiver<OutboundEvent>,
    }

    async fn join(repository: Arc<InMemoryRoomRepository>, room: &str, name: &str) -> Joined {
        join_as(repository, PeerId::from(uuid::Uuid::new_v4()), room, name).await
    }

    async fn join_as(
        repository: Arc<InMemoryRoomRepository>,
        peer_id: PeerId,
        room: &str,
        name: &str,
    ) -> Joined {
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
                    room_id: RoomId::new(room.to_string()).unwrap(),
                    display_name: DisplayName::new(name.to_string()).unwrap(),
                },
                TransactionId::generate(),
            )
            .await
            .unwrap();
        while rx.try_recv().is_ok() {}
        Joined {
            connection,
            peer_id,
            rx,
        }
    }

    fn create_usecase(repository: Arc<InMemoryRoomRepository>) -> RelaySignalUseCase {
        RelaySignalUseCase::new(repository, Arc::new(FixedClock::new(2_000)))
    }

    #[tokio::test]
    async fn test_offer_is_delivered_to_target_only() {
        // テスト項目: offer が宛先にだけ、送信者情報とタイムスタンプ付きで届く
        // given (前提条件):
        let repository = Arc::new(InMemoryRoomRepository::default());
        let mut alice = join(repository.clone(), "abc", "Alice").await;
        let mut bob = join(repository.clone(), "abc", "Bob").await;
        let mut carol = join(repository.clone(), "abc", "Carol").await;
        while alice.rx.try_recv().is_ok() {}
        while bob.rx.try_recv().is_ok() {}
        let usecase = create_usecase(repository);
        let transaction_id = TransactionId::generate();

        // when (操作):
        usecase
            .execute(
                &alice.connection,
                SignalRequest {
                    kind: SignalKind::Offer,
                    target: bob.peer_id,
                    payload: serde_json::json!({"sdp": "v=0"}),
                },
                transaction_id,
            )
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(
            bob.rx.try_recv().unwrap(),
            OutboundEvent::Signal {
                kind: SignalKind::Offer,
                payload: serde_json::json!({"sdp": "v=0"}),
                from: alice.peer_id,
                display_name: DisplayName::new("Alice".to_string()).unwrap(),
                timestamp: Timestamp::new(2_000),
                transaction_id,
            }
        );
        assert!(alice.rx.try_recv().is_err());
        assert!(carol.rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_target_in_other_room_is_not_found() {
        // テスト項目: 別ルームにいるピアを宛先にすると 404 となり、配送されない
        // given (前提条件):
        let repository = Arc::new(InMemoryRoomRepository::default());
        let alice = join(repository.clone(), "abc", "Alice").await;
        let mut dave = join(repository.clone(), "xyz", "Dave").await;
        let usecase = create_usecase(repository);

        // when (操作):
        let result = usecase
            .execute(
                &alice.connection,
                SignalRequest {
                    kind: SignalKind::IceCandidate,
                    target: dave.peer_id,
                    payload: serde_json::Value::Null,
                },
                TransactionId::generate(),
            )
            .await;

        // then (期待する結果):
        assert_eq!(result, Err(RelayError::PeerNotFound));
        assert!(dave.rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_unjoined_sender_is_rejected() {
        // テスト項目: 未参加の接続からのシグナリングは NotJoined になる
        // given (前提条件):
        let repository = Arc::new(InMemoryRoomRepository::default());
        let usecase = create_usecase(repository);
        let (tx, _rx) = mpsc::unbounded_channel();
        let connection = ConnectionState::new(tx);

        // when (操作):
        let result = usecase
            .execute(
                &connection,
                SignalRequest {
                    kind: SignalKind::Answer,
                    target: PeerId::from(uuid::Uuid::new_v4()),
                    payload: serde_json::Value::Null,
                },
                TransactionId::generate(),
            )
            .await;

        // then (期待する結果):
        assert_eq!(result, Err(RelayError::NotJoined));
    }

    #[tokio::test]
    async fn test_replaced_connection_is_not_joined() {
        // テスト項目: 同じ peer id で別の接続が参加した後、古い接続からのシグナリングは NotJoined になり配送されない
        // given (前提条件):
        let repository = Arc::new(InMemoryRoomRepository::default());
        let stale = join(repository.clone(), "abc", "Alice").await;
        let mut bob = join(repository.clone(), "abc", "Bob").await;
        let _current = join_as(repository.clone(), stale.peer_id, "abc", "Alice").await;
        while bob.rx.try_recv().is_ok() {}
        let usecase = create_usecase(repository);

        // when (操作):
        let result = usecase
            .execute(
                &stale.connection,
                SignalRequest {
                    kind: SignalKind::Offer,
                    target: bob.peer_id,
                    payload: serde_json::json!({"sdp": "v=0"}),
                },
                TransactionId::generate(),
            )
            .await;

        // then (期待する結果):
        assert_eq!(result, Err(RelayError::NotJoined));
        assert!(bob.rx.try_recv().is_err());
    }
}
