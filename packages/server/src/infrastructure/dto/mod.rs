//! Data Transfer Objects (DTOs) for the signaling relay.
//!
//! DTOs are organized by protocol:
//! - `websocket`: WebSocket frames (client → server and server → client)
//! - `http`: HTTP API response bodies

pub mod conversion;
pub mod http;
pub mod websocket;
