//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{Json, extract::State};

use crate::{
    infrastructure::dto::http::{RoomStatsDto, StatsDto, StatusDto},
    ui::state::AppState,
};
use genkan_shared::time::timestamp_to_rfc3339;

/// Health check endpoint (`GET /` without an upgrade)
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<StatusDto> {
    Json(StatusDto {
        status: "healthy".to_string(),
        timestamp: timestamp_to_rfc3339(state.clock.now_millis()),
        connections: state.connection_tracker.count().await,
        rooms: state.get_stats_usecase.count_rooms().await,
    })
}

/// Per-room statistics
pub async fn get_stats(State(state): State<Arc<AppState>>) -> Json<StatsDto> {
    let snapshots = state.get_stats_usecase.execute().await;

    // Domain Model から DTO への変換
    let rooms = snapshots
        .into_iter()
        .map(|room| RoomStatsDto {
            id: room.id.into_string(),
            created: timestamp_to_rfc3339(room.created_at.value()),
            participants: room.participants,
            message_count: room.message_count,
        })
        .collect();

    Json(StatsDto {
        rooms,
        total_participants: state.connection_tracker.count().await,
    })
}
