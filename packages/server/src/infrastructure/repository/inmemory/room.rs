//! InMemory Room Repository 実装
//!
//! ドメイン層が定義する `RoomRepository` trait の具体的な実装。
//! `HashMap<RoomId, Room>` を 1 つの `Mutex` で保護し、各操作（参加・退出・
//! シグナリング転送・チャット）の変更と通知を同じクリティカルセクション内で
//! 行います。通知は各接続の unbounded channel への push なのでブロックしません。
//!
//! ## 不変条件
//!
//! - ルームは参加者が 1 人以上いる間だけ存在する（空になった瞬間に削除）
//! - ルームは最初の参加時に遅延生成される

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{
    ChatLog, ChatMessage, ConnectionId, DEFAULT_CHAT_CAPACITY, LeaveOutcome, OutboundEvent,
    PeerId, PeerSession, RepositoryError, Room, RoomId, RoomRepository, RoomSnapshot, Timestamp,
    TransactionId,
};

/// 履歴再送の既定件数
pub const DEFAULT_HISTORY_REPLAY: usize = 20;

/// ルーム生成時に適用する設定
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoomSettings {
    /// チャット履歴の保持件数
    pub chat_capacity: usize,
    /// 参加時に再送する履歴の件数
    pub history_replay: usize,
}

impl Default for RoomSettings {
    fn default() -> Self {
        Self {
            chat_capacity: DEFAULT_CHAT_CAPACITY,
            history_replay: DEFAULT_HISTORY_REPLAY,
        }
    }
}

/// インメモリ Room Repository 実装
pub struct InMemoryRoomRepository {
    /// room id → Room
    rooms: Mutex<HashMap<RoomId, Room>>,
    settings: RoomSettings,
}

impl InMemoryRoomRepository {
    /// 新しい InMemoryRoomRepository を作成
    pub fn new(settings: RoomSettings) -> Self {
        Self {
            rooms: Mutex::new(HashMap::new()),
            settings,
        }
    }
}

#[cfg(test)]
impl InMemoryRoomRepository {
    /// ルームのチャット履歴（古い順）
    pub async fn chat_history(&self, room_id: &RoomId) -> Vec<ChatMessage> {
        let rooms = self.rooms.lock().await;
        rooms
            .get(room_id)
            .map(|room| room.chat_log().iter().cloned().collect())
            .unwrap_or_default()
    }

    pub async fn room_exists(&self, room_id: &RoomId) -> bool {
        self.rooms.lock().await.contains_key(room_id)
    }
}

fn not_member(room_id: &RoomId, peer_id: &PeerId) -> RepositoryError {
    RepositoryError::NotMember {
        room_id: room_id.as_str().to_string(),
        peer_id: peer_id.to_string(),
    }
}

impl Default for InMemoryRoomRepository {
    fn default() -> Self {
        Self::new(RoomSettings::default())
    }
}

#[async_trait]
impl RoomRepository for InMemoryRoomRepository {
    async fn join(
        &self,
        room_id: RoomId,
        session: PeerSession,
        transaction_id: TransactionId,
    ) -> Result<usize, RepositoryError> {
        let created_at = session.joined_at;
        let peer_id = session.id;

        let mut rooms = self.rooms.lock().await;
        let room = rooms.entry(room_id.clone()).or_insert_with(|| {
            tracing::info!("Room '{}' created", room_id);
            Room::new(
                room_id.clone(),
                created_at,
                ChatLog::with_capacity(self.settings.chat_capacity),
            )
        });

        let admission = room.admit(session, self.settings.history_replay, transaction_id);
        if admission.replaced {
            tracing::warn!(
                "Peer '{}' re-joined room '{}'; replaced the previous session",
                peer_id,
                room_id
            );
        }

        Ok(admission.participant_count)
    }

    async fn leave(
        &self,
        room_id: &RoomId,
        peer_id: &PeerId,
        connection_id: ConnectionId,
        timestamp: Timestamp,
        transaction_id: TransactionId,
    ) -> Result<LeaveOutcome, RepositoryError> {
        let mut rooms = self.rooms.lock().await;
        let Some(room) = rooms.get_mut(room_id) else {
            return Ok(LeaveOutcome::NotPresent);
        };

        if room
            .depart(peer_id, connection_id, timestamp, transaction_id)
            .is_none()
        {
            return Ok(LeaveOutcome::NotPresent);
        }

        let remaining = room.participant_count();
        let room_removed = room.is_empty();
        if room_removed {
            rooms.remove(room_id);
            tracing::info!("Room '{}' is empty, removing", room_id);
        }

        Ok(LeaveOutcome::Left {
            remaining,
            room_removed,
        })
    }

    async fn forward_signal(
        &self,
        room_id: &RoomId,
        sender: &PeerId,
        connection_id: ConnectionId,
        target: &PeerId,
        event: OutboundEvent,
    ) -> Result<bool, RepositoryError> {
        let rooms = self.rooms.lock().await;
        let room = rooms
            .get(room_id)
            .filter(|room| room.is_held_by(sender, connection_id))
            .ok_or_else(|| not_member(room_id, sender))?;
        Ok(room.forward_to(target, event))
    }

    async fn post_chat(
        &self,
        room_id: &RoomId,
        connection_id: ConnectionId,
        message: ChatMessage,
        transaction_id: TransactionId,
    ) -> Result<usize, RepositoryError> {
        let mut rooms = self.rooms.lock().await;
        let room = rooms
            .get_mut(room_id)
            .filter(|room| room.is_held_by(&message.from, connection_id))
            .ok_or_else(|| not_member(room_id, &message.from))?;
        Ok(room.post_chat(message, transaction_id))
    }

    async fn count_rooms(&self) -> usize {
        self.rooms.lock().await.len()
    }

    async fn room_snapshots(&self) -> Vec<RoomSnapshot> {
        let rooms = self.rooms.lock().await;
        let mut snapshots: Vec<RoomSnapshot> = rooms
            .values()
            .map(|room| RoomSnapshot {
                id: room.id.clone(),
                created_at: room.created_at,
                participants: room.participant_count(),
                message_count: room.chat_log().len(),
            })
            .collect();
        snapshots.sort_by(|a, b| a.id.cmp(&b.id));
        snapshots
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ChatText, DisplayName, MessageId, SignalKind};
    use tokio::sync::mpsc;

    // ========================================
    // テスト作業記録
    // ========================================
    // 【何をテストするか】
    // - ルームの遅延生成と、空になった瞬間の削除
    // - 退出時の user-left 通知
    // - シグナリング転送がルーム内に閉じていること
    // - チャット履歴の上限
    // - 置き換えられた接続からのチャット・シグナリングの拒否
    // ========================================

    struct TestPeer {
        session: PeerSession,
        rx: mpsc::UnboundedReceiver<OutboundEvent>,
    }

    fn create_test_peer(name: &str) -> TestPeer {
        let (tx, rx) = mpsc::unbounded_channel();
        let session = PeerSession::new(
            PeerId::from(uuid::Uuid::new_v4()),
            DisplayName::new(name.to_string()).unwrap(),
            ConnectionId::generate(),
            Timestamp::new(1_000),
            tx,
        );
        TestPeer { session, rx }
    }

    fn chat_from(peer: &TestPeer, text: &str) -> ChatMessage {
        ChatMessage {
            id: MessageId::generate(),
            from: peer.session.id,
            display_name: peer.session.display_name.clone(),
            text: ChatText::new(text.to_string()).unwrap(),
            timestamp: Timestamp::new(1_200),
        }
    }

    fn room(id: &str) -> RoomId {
        RoomId::new(id.to_string()).unwrap()
    }

    async fn leave(repository: &InMemoryRoomRepository, room_id: &RoomId, peer: &TestPeer) -> LeaveOutcome {
        repository
            .leave(
                room_id,
                &peer.session.id,
                peer.session.connection_id,
                Timestamp::new(2_000),
                TransactionId::generate(),
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_room_is_created_on_first_join() {
        // テスト項目: 存在しないルームへの参加でルームが生成される
        // given (前提条件):
        let repository = InMemoryRoomRepository::default();
        let alice = create_test_peer("Alice");

        // when (操作):
        let count = repository
            .join(room("abc"), alice.session.clone(), TransactionId::generate())
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(count, 1);
        assert!(repository.room_exists(&room("abc")).await);
        assert_eq!(repository.count_rooms().await, 1);
    }

    #[tokio::test]
    async fn test_room_exists_iff_non_empty() {
        // テスト項目: 参加・退出の任意の順序の後で「ルームが存在する ⇔ 参加者がいる」が成り立つ
        // given (前提条件):
        let repository = InMemoryRoomRepository::default();
        let peers: Vec<TestPeer> = (0..3).map(|n| create_test_peer(&format!("p{n}"))).collect();
        let abc = room("abc");
        let xyz = room("xyz");

        // when (操作) / then (期待する結果):
        repository.join(abc.clone(), peers[0].session.clone(), TransactionId::generate()).await.unwrap();
        repository.join(xyz.clone(), peers[1].session.clone(), TransactionId::generate()).await.unwrap();
        repository.join(abc.clone(), peers[2].session.clone(), TransactionId::generate()).await.unwrap();
        assert!(repository.room_exists(&abc).await && repository.room_exists(&xyz).await);

        leave(&repository, &abc, &peers[0]).await;
        assert!(repository.room_exists(&abc).await);

        leave(&repository, &xyz, &peers[1]).await;
        assert!(!repository.room_exists(&xyz).await);

        leave(&repository, &abc, &peers[2]).await;
        assert!(!repository.room_exists(&abc).await);
        assert_eq!(repository.count_rooms().await, 0);
    }

    #[tokio::test]
    async fn test_last_peer_leaving_removes_room() {
        // テスト項目: 最後の参加者が退出するとルームが削除される
        // given (前提条件):
        let repository = InMemoryRoomRepository::default();
        let alice = create_test_peer("Alice");
        repository.join(room("xyz"), alice.session.clone(), TransactionId::generate()).await.unwrap();

        // when (操作):
        let outcome = leave(&repository, &room("xyz"), &alice).await;

        // then (期待する結果):
        assert_eq!(
            outcome,
            LeaveOutcome::Left {
                remaining: 0,
                room_removed: true
            }
        );
        assert!(!repository.room_exists(&room("xyz")).await);
    }

    #[tokio::test]
    async fn test_leave_twice_has_no_extra_effect() {
        // テスト項目: 同じ接続の退出処理を 2 回実行しても追加の影響はない
        // given (前提条件):
        let repository = InMemoryRoomRepository::default();
        let alice = create_test_peer("Alice");
        let mut bob = create_test_peer("Bob");
        repository.join(room("abc"), alice.session.clone(), TransactionId::generate()).await.unwrap();
        repository.join(room("abc"), bob.session.clone(), TransactionId::generate()).await.unwrap();
        while bob.rx.try_recv().is_ok() {}

        // when (操作):
        let first = leave(&repository, &room("abc"), &alice).await;
        let second = leave(&repository, &room("abc"), &alice).await;

        // then (期待する結果):
        assert!(matches!(first, LeaveOutcome::Left { remaining: 1, .. }));
        assert_eq!(second, LeaveOutcome::NotPresent);
        let mut user_left = 0;
        while let Ok(event) = bob.rx.try_recv() {
            assert!(matches!(event, OutboundEvent::UserLeft { .. }));
            user_left += 1;
        }
        assert_eq!(user_left, 1);
    }

    #[tokio::test]
    async fn test_forward_signal_does_not_cross_rooms() {
        // テスト項目: 別のルームにいる参加者へはシグナリングを転送できない
        // given (前提条件):
        let repository = InMemoryRoomRepository::default();
        let alice = create_test_peer("Alice");
        let mut bob = create_test_peer("Bob");
        repository.join(room("abc"), alice.session.clone(), TransactionId::generate()).await.unwrap();
        repository.join(room("xyz"), bob.session.clone(), TransactionId::generate()).await.unwrap();
        while bob.rx.try_recv().is_ok() {}
        let event = OutboundEvent::Signal {
            kind: SignalKind::Offer,
            payload: serde_json::json!({"sdp": "v=0"}),
            from: alice.session.id,
            display_name: alice.session.display_name.clone(),
            timestamp: Timestamp::new(1_500),
            transaction_id: TransactionId::generate(),
        };

        // when (操作):
        let delivered = repository
            .forward_signal(
                &room("abc"),
                &alice.session.id,
                alice.session.connection_id,
                &bob.session.id,
                event,
            )
            .await
            .unwrap();

        // then (期待する結果):
        assert!(!delivered);
        assert!(bob.rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_chat_history_is_capped() {
        // テスト項目: チャット履歴は設定された上限を超えない
        // given (前提条件):
        let repository = InMemoryRoomRepository::new(RoomSettings {
            chat_capacity: 5,
            history_replay: 3,
        });
        let alice = create_test_peer("Alice");
        repository.join(room("abc"), alice.session.clone(), TransactionId::generate()).await.unwrap();

        // when (操作):
        for n in 0..8 {
            let message = chat_from(&alice, &format!("m{n}"));
            repository
                .post_chat(&room("abc"), alice.session.connection_id, message, TransactionId::generate())
                .await
                .unwrap();
        }

        // then (期待する結果):
        let history = repository.chat_history(&room("abc")).await;
        let texts: Vec<&str> = history.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["m3", "m4", "m5", "m6", "m7"]);
        let snapshots = repository.room_snapshots().await;
        assert_eq!(snapshots[0].message_count, 5);
    }

    #[tokio::test]
    async fn test_post_chat_to_missing_room_is_not_member() {
        // テスト項目: 存在しないルームへのチャット投稿は NotMember になる
        // given (前提条件):
        let repository = InMemoryRoomRepository::default();
        let alice = create_test_peer("Alice");

        // when (操作):
        let result = repository
            .post_chat(
                &room("gone"),
                alice.session.connection_id,
                chat_from(&alice, "hi"),
                TransactionId::generate(),
            )
            .await;

        // then (期待する結果):
        assert_eq!(
            result,
            Err(RepositoryError::NotMember {
                room_id: "gone".to_string(),
                peer_id: alice.session.id.to_string(),
            })
        );
    }

    #[tokio::test]
    async fn test_replaced_session_can_no_longer_chat() {
        // テスト項目: 同じ peer id で別の接続が参加した後、古い接続からのチャットは拒否され履歴に残らない
        // given (前提条件):
        let repository = InMemoryRoomRepository::default();
        let stale = create_test_peer("Alice");
        let (tx, _rx) = mpsc::unbounded_channel();
        let current = PeerSession::new(
            stale.session.id,
            stale.session.display_name.clone(),
            ConnectionId::generate(),
            Timestamp::new(1_100),
            tx,
        );
        repository.join(room("abc"), stale.session.clone(), TransactionId::generate()).await.unwrap();
        repository.join(room("abc"), current, TransactionId::generate()).await.unwrap();

        // when (操作):
        let result = repository
            .post_chat(
                &room("abc"),
                stale.session.connection_id,
                chat_from(&stale, "hi"),
                TransactionId::generate(),
            )
            .await;

        // then (期待する結果):
        assert!(matches!(result, Err(RepositoryError::NotMember { .. })));
        assert!(repository.chat_history(&room("abc")).await.is_empty());
    }

    #[tokio::test]
    async fn test_replaced_session_can_no_longer_signal() {
        // テスト項目: 置き換えられた接続からのシグナリングは転送されず NotMember になる
        // given (前提条件):
        let repository = InMemoryRoomRepository::default();
        let stale = create_test_peer("Alice");
        let mut bob = create_test_peer("Bob");
        let (tx, _rx) = mpsc::unbounded_channel();
        let current = PeerSession::new(
            stale.session.id,
            stale.session.display_name.clone(),
            ConnectionId::generate(),
            Timestamp::new(1_100),
            tx,
        );
        repository.join(room("abc"), stale.session.clone(), TransactionId::generate()).await.unwrap();
        repository.join(room("abc"), bob.session.clone(), TransactionId::generate()).await.unwrap();
        repository.join(room("abc"), current, TransactionId::generate()).await.unwrap();
        while bob.rx.try_recv().is_ok() {}
        let event = OutboundEvent::Signal {
            kind: SignalKind::Offer,
            payload: serde_json::json!({"sdp": "v=0"}),
            from: stale.session.id,
            display_name: stale.session.display_name.clone(),
            timestamp: Timestamp::new(1_500),
            transaction_id: TransactionId::generate(),
        };

        // when (操作):
        let result = repository
            .forward_signal(
                &room("abc"),
                &stale.session.id,
                stale.session.connection_id,
                &bob.session.id,
                event,
            )
            .await;

        // then (期待する結果):
        assert!(matches!(result, Err(RepositoryError::NotMember { .. })));
        assert!(bob.rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_room_snapshots_are_sorted_by_id() {
        // テスト項目: スナップショットはルーム ID 順に並ぶ
        // given (前提条件):
        let repository = InMemoryRoomRepository::default();
        for id in ["zeta", "alpha", "mid"] {
            let peer = create_test_peer(id);
            repository.join(room(id), peer.session, TransactionId::generate()).await.unwrap();
        }

        // when (操作):
        let snapshots = repository.room_snapshots().await;

        // then (期待する結果):
        let ids: Vec<&str> = snapshots.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["alpha", "mid", "zeta"]);
        assert!(snapshots.iter().all(|s| s.participants == 1));
    }
}
