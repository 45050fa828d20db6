//! UI layer: axum routes, WebSocket connection handling and the heartbeat.

mod handler;
pub mod heartbeat;
pub mod router;
mod server;
mod signal;
pub mod state;

pub use server::{Server, ServerError};
