//! UseCase: 切断時の退出処理
//!
//! ## 責務
//!
//! - 接続を `Closed` に遷移させる（何度呼ばれても 2 回目以降は何もしない）
//! - 参加済みだった場合のみ、Repository 経由で PeerSession を除去し、
//!   残りの参加者に user-left を通知する
//! - ルームが空になった場合は Repository 側でルームを削除する
//!
//! ソケットの正常切断でもハートビートによる強制切断でも、同じ経路を通る。

use std::sync::Arc;

use genkan_shared::time::Clock;

use crate::domain::{
    ConnectionState, LeaveOutcome, RelayError, RoomRepository, Timestamp, TransactionId,
};

/// 退出のユースケース
pub struct LeaveRoomUseCase {
    /// Repository（データアクセス層の抽象化）
    repository: Arc<dyn RoomRepository>,
    /// Clock（時刻取得の抽象化）
    clock: Arc<dyn Clock>,
}

impl LeaveRoomUseCase {
    /// 新しい LeaveRoomUseCase を作成
    pub fn new(repository: Arc<dyn RoomRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { repository, clock }
    }

    /// 退出処理を実行
    ///
    /// # Returns
    ///
    /// * `Ok(LeaveOutcome::NotPresent)` - 未参加、または既に退出済み
    /// * `Ok(LeaveOutcome::Left { .. })` - 退出した
    pub async fn execute(
        &self,
        connection: &mut ConnectionState,
    ) -> Result<LeaveOutcome, RelayError> {
        let Some(session) = connection.close() else {
            return Ok(LeaveOutcome::NotPresent);
        };

        let outcome = self
            .repository
            .leave(
                &session.room_id,
                &session.peer_id,
                connection.id(),
                Timestamp::new(self.clock.now_millis()),
                TransactionId::generate(),
            )
            .await?;

        if let LeaveOutcome::Left { remaining, .. } = outcome {
            tracing::info!(
                "Peer '{}' left room '{}' ({} remaining)",
                session.peer_id,
                session.room_id,
                remaining
            );
        }
        Ok(outcome)
    }
}
