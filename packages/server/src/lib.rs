//! WebRTC signaling relay.
//!
//! Peers join named rooms over WebSocket, exchange offers, answers and ICE
//! candidates through the relay, and share a small chat log per room.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

pub mod bootstrap;
pub mod config;
