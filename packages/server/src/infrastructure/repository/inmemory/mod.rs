//! In-memory registry, the only storage the relay has.

pub mod room;

pub use room::{InMemoryRoomRepository, RoomSettings};
