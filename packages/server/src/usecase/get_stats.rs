//! UseCase: 統計情報取得処理
//!
//! HTTP のヘルスチェックと `/api/stats` 用に、ルームの読み取り専用スナップショットを返す。

use std::sync::Arc;

use crate::domain::{RoomRepository, RoomSnapshot};

/// 統計情報取得のユースケース
pub struct GetStatsUseCase {
    /// Repository（データアクセス層の抽象化）
    repository: Arc<dyn RoomRepository>,
}

impl GetStatsUseCase {
    /// 新しい GetStatsUseCase を作成
    pub fn new(repository: Arc<dyn RoomRepository>) -> Self {
        Self { repository }
    }

    /// 全ルームのスナップショット（ルーム ID 順）
    pub async fn execute(&self) -> Vec<RoomSnapshot> {
        self.repository.room_snapshots().await
    }

    /// 現在のルーム数
    pub async fn count_rooms(&self) -> usize {
        self.repository.count_rooms().await
    }
}
