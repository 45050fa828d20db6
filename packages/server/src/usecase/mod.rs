//! UseCase 層
//!
//! 接続ハンドラから呼ばれるアプリケーションロジック。
//! Repository（`RoomRepository`）の抽象にのみ依存する。

mod get_stats;
mod join_room;
mod leave_room;
mod relay_signal;
mod send_chat;

pub use get_stats::GetStatsUseCase;
pub use join_room::JoinRoomUseCase;
pub use leave_room::LeaveRoomUseCase;
pub use relay_signal::RelaySignalUseCase;
pub use send_chat::SendChatUseCase;
