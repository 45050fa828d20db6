//! Shared application state.

use std::sync::Arc;

use genkan_shared::time::Clock;

use crate::usecase::{GetStatsUseCase, LeaveRoomUseCase};

use super::{heartbeat::ConnectionTracker, router::MessageRouter};

/// State handed to every axum handler
pub struct AppState {
    /// Routes inbound frames to the join / relay / chat use cases
    pub message_router: Arc<MessageRouter>,
    /// LeaveRoomUseCase（切断時の退出処理）
    pub leave_room_usecase: Arc<LeaveRoomUseCase>,
    /// GetStatsUseCase（統計情報取得）
    pub get_stats_usecase: Arc<GetStatsUseCase>,
    /// Live connections and their heartbeat state
    pub connection_tracker: Arc<ConnectionTracker>,
    pub clock: Arc<dyn Clock>,
}
