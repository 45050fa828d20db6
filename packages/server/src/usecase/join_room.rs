//! UseCase: ルーム参加処理
//!
//! ## 責務
//!
//! - 接続が未参加であることの確認（二重参加は 400 で拒否）
//! - Repository 経由でルームを取得または作成し、PeerSession を登録
//! - 参加時のハンドシェイク（履歴、相互の user-joined、join-success）は
//!   Repository のクリティカルセクション内で送信される
//! - 成功後に接続を `Joined` へ遷移させ、レートリミッタを開始
//!
//! ## 注意
//!
//! `repository.join()` の完了と `mark_joined()` の間に await を挟まないこと。
//! 接続タスクが中断されても、登録済みのセッションが必ず切断処理で除去されるようにするため。

use std::sync::Arc;

use genkan_shared::time::Clock;

use crate::domain::{
    ConnectionState, JoinRequest, JoinedSession, PeerSession, RateLimitPolicy, RateLimiter,
    RelayError, RoomRepository, Timestamp, TransactionId,
};

/// ルーム参加のユースケース
pub struct JoinRoomUseCase {
    /// Repository（データアクセス層の抽象化）
    repository: Arc<dyn RoomRepository>,
    /// Clock（時刻取得の抽象化）
    clock: Arc<dyn Clock>,
    /// 参加後に適用するレート制限
    rate_policy: RateLimitPolicy,
}

impl JoinRoomUseCase {
    /// 新しい JoinRoomUseCase を作成
    pub fn new(
        repository: Arc<dyn RoomRepository>,
        clock: Arc<dyn Clock>,
        rate_policy: RateLimitPolicy,
    ) -> Self {
        Self {
            repository,
            clock,
            rate_policy,
        }
    }

    /// ルーム参加を実行
    ///
    /// # Returns
    ///
    /// * `Ok(usize)` - 参加後のルーム人数
    /// * `Err(RelayError)` - 二重参加、閉じた接続、または Repository の失敗
    pub async fn execute(
        &self,
        connection: &mut ConnectionState,
        request: JoinRequest,
        transaction_id: TransactionId,
    ) -> Result<usize, RelayError> {
        connection.ensure_can_join()?;

        let joined_at = Timestamp::new(self.clock.now_millis());
        let session = PeerSession::new(
            request.peer_id,
            request.display_name.clone(),
            connection.id(),
            joined_at,
            connection.outbox().clone(),
        );

        // 1. Repository 経由でルームに登録（通知もここで送信される）
        let participant_count = self
            .repository
            .join(request.room_id.clone(), session, transaction_id)
            .await?;

        // 2. 接続を Joined に遷移
        connection.mark_joined(JoinedSession {
            peer_id: request.peer_id,
            room_id: request.room_id.clone(),
            display_name: request.display_name.clone(),
            rate_limiter: RateLimiter::new(self.rate_policy, joined_at),
        })?;

        tracing::info!(
            "Peer '{}' ({}) joined room '{}' ({} participants)",
            request.peer_id,
            request.display_name,
            request.room_id,
            participant_count
        );

        Ok(participant_count)
    }
}
