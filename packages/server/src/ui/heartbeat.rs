//! Heartbeat monitor.
//!
//! The monitor only reads liveness flags and asks connections to ping or
//! terminate through their control channel. Cleanup always happens in the
//! connection task's own close path.

use std::{collections::HashMap, sync::Arc, time::Duration};

use genkan_shared::time::Clock;
use tokio::{
    sync::{Mutex, mpsc},
    task::JoinHandle,
    time::{Instant, MissedTickBehavior},
};

use crate::domain::{ConnectionId, Timestamp};

/// Requests from the monitor to a connection's writer task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionControl {
    /// Send a WebSocket ping
    Ping,
    /// Drop the socket without a close frame
    Terminate,
}

pub type ControlChannel = mpsc::UnboundedSender<ConnectionControl>;

#[derive(Debug)]
struct Liveness {
    alive: bool,
    last_alive: Timestamp,
    control: ControlChannel,
}

/// Live connections and their liveness flags
#[derive(Debug, Default)]
pub struct ConnectionTracker {
    connections: Mutex<HashMap<ConnectionId, Liveness>>,
}

/// Outcome of one sweep
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SweepReport {
    pub pinged: usize,
    pub terminated: Vec<ConnectionId>,
}

impl ConnectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register(&self, id: ConnectionId, control: ControlChannel, now: Timestamp) {
        self.connections.lock().await.insert(
            id,
            Liveness {
                alive: true,
                last_alive: now,
                control,
            },
        );
    }

    pub async fn unregister(&self, id: &ConnectionId) {
        self.connections.lock().await.remove(id);
    }

    /// Record a pong
    pub async fn mark_alive(&self, id: &ConnectionId, now: Timestamp) {
        if let Some(liveness) = self.connections.lock().await.get_mut(id) {
            liveness.alive = true;
            liveness.last_alive = now;
        }
    }

    /// Number of live WebSocket connections
    pub async fn count(&self) -> usize {
        self.connections.lock().await.len()
    }

    /// Terminate connections that missed the last ping or went silent for
    /// longer than `timeout`, then ping the rest.
    pub async fn sweep(&self, now: Timestamp, timeout: Duration) -> SweepReport {
        let timeout_ms = i64::try_from(timeout.as_millis()).unwrap_or(i64::MAX);
        let mut report = SweepReport::default();
        let mut connections = self.connections.lock().await;

        connections.retain(|id, liveness| {
            if !liveness.alive || now.millis_since(liveness.last_alive) > timeout_ms {
                let _ = liveness.control.send(ConnectionControl::Terminate);
                report.terminated.push(*id);
                return false;
            }

            liveness.alive = false;
            if liveness.control.send(ConnectionControl::Ping).is_ok() {
                report.pinged += 1;
            }
            true
        });

        report
    }
}

/// Periodic sweeper over a `ConnectionTracker`
pub struct HeartbeatMonitor;

impl HeartbeatMonitor {
    /// Spawn the sweep loop. The first sweep runs one `interval` after start.
    pub fn spawn(
        tracker: Arc<ConnectionTracker>,
        clock: Arc<dyn Clock>,
        interval: Duration,
        timeout: Duration,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                ticker.tick().await;
                let now = Timestamp::new(clock.now_millis());
                let report = tracker.sweep(now, timeout).await;
                for id in &report.terminated {
                    tracing::warn!("Connection '{}' missed its heartbeat, terminating", id);
                }
                tracing::debug!("Heartbeat sent {} ping(s)", report.pinged);
            }
        })
    }
}
