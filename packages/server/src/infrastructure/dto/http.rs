//! HTTP API response DTOs.

use serde::{Deserialize, Serialize};

/// Body of `GET /`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusDto {
    pub status: String,
    /// RFC 3339
    pub timestamp: String,
    /// Live WebSocket connections
    pub connections: usize,
    pub rooms: usize,
}

/// One entry of `GET /api/stats`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomStatsDto {
    pub id: String,
    /// RFC 3339
    pub created: String,
    pub participants: usize,
    pub message_count: usize,
}

/// Body of `GET /api/stats`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsDto {
    pub rooms: Vec<RoomStatsDto>,
    pub total_participants: usize,
}
