//! Per-peer sliding-window message limiter.

use super::value_object::Timestamp;

/// Window length used unless configured otherwise
pub const DEFAULT_RATE_WINDOW_MS: i64 = 1_000;
/// Messages allowed per window unless configured otherwise
pub const DEFAULT_RATE_MAX_MESSAGES: u32 = 10;

/// Limits applied to every joined peer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
    pub window_ms: i64,
    pub max_messages: u32,
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        Self {
            window_ms: DEFAULT_RATE_WINDOW_MS,
            max_messages: DEFAULT_RATE_MAX_MESSAGES,
        }
    }
}

/// Outcome of recording one inbound message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allowed,
    Limited,
}

/// Message counter for one peer.
///
/// A message arriving more than one window after the previous one resets the
/// counter to 1; otherwise the counter grows. Rejected messages are counted
/// too, so a peer that keeps sending inside the window stays limited.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    policy: RateLimitPolicy,
    count: u32,
    last_message_at: Timestamp,
}

impl RateLimiter {
    /// Start tracking a peer that joined at `started_at`
    pub fn new(policy: RateLimitPolicy, started_at: Timestamp) -> Self {
        Self {
            policy,
            count: 0,
            last_message_at: started_at,
        }
    }

    /// Record a message received at `now` and decide whether it may be processed
    pub fn hit(&mut self, now: Timestamp) -> RateDecision {
        if now.millis_since(self.last_message_at) > self.policy.window_ms {
            self.count = 1;
        } else {
            self.count = self.count.saturating_add(1);
        }
        self.last_message_at = now;

        if self.count > self.policy.max_messages {
            RateDecision::Limited
        } else {
            RateDecision::Allowed
        }
    }

    pub fn count(&self) -> u32 {
        self.count
    }
}
