//! HTTP and WebSocket handlers.

mod http;
mod websocket;

pub use http::get_stats;
pub use websocket::{root_handler, websocket_handler};
