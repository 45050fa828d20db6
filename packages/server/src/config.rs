//! Relay configuration.
//!
//! Protocol limits have fixed defaults; the binary only overrides the
//! transport-facing knobs (CORS origin, heartbeat timing).

use std::time::Duration;

use crate::{domain::RateLimitPolicy, infrastructure::repository::RoomSettings};

/// Largest accepted inbound frame (64 KiB)
pub const DEFAULT_MAX_FRAME_BYTES: usize = 64 * 1024;
/// Heartbeat ping period
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);
/// A connection silent for longer than this is terminated
pub const DEFAULT_HEARTBEAT_TIMEOUT: Duration = Duration::from_secs(40);
/// Allowed CORS origin; `*` allows any
pub const DEFAULT_CORS_ORIGIN: &str = "*";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayConfig {
    /// Frames larger than this are rejected before parsing
    pub max_frame_bytes: usize,
    pub rate_limit: RateLimitPolicy,
    pub rooms: RoomSettings,
    pub heartbeat_interval: Duration,
    pub heartbeat_timeout: Duration,
    pub cors_origin: String,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            max_frame_bytes: DEFAULT_MAX_FRAME_BYTES,
            rate_limit: RateLimitPolicy::default(),
            rooms: RoomSettings::default(),
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
            heartbeat_timeout: DEFAULT_HEARTBEAT_TIMEOUT,
            cors_origin: DEFAULT_CORS_ORIGIN.to_string(),
        }
    }
}
