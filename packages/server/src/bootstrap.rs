//! Dependency wiring.

use std::sync::Arc;

use genkan_shared::time::Clock;

use crate::{
    config::RelayConfig,
    domain::RoomRepository,
    infrastructure::repository::InMemoryRoomRepository,
    ui::{Server, heartbeat::ConnectionTracker, router::MessageRouter, state::AppState},
    usecase::{
        GetStatsUseCase, JoinRoomUseCase, LeaveRoomUseCase, RelaySignalUseCase, SendChatUseCase,
    },
};

/// Build a ready-to-run server from `config`
pub fn build_server(config: RelayConfig, clock: Arc<dyn Clock>) -> Server {
    // Initialize dependencies in order:
    // 1. Repository
    // 2. UseCases
    // 3. MessageRouter
    // 4. AppState
    // 5. Server

    // 1. Create Repository (in-memory room registry)
    let repository: Arc<dyn RoomRepository> = Arc::new(InMemoryRoomRepository::new(config.rooms));

    // 2. Create UseCases
    let join_room_usecase = Arc::new(JoinRoomUseCase::new(
        repository.clone(),
        clock.clone(),
        config.rate_limit,
    ));
    let relay_signal_usecase = Arc::new(RelaySignalUseCase::new(repository.clone(), clock.clone()));
    let send_chat_usecase = Arc::new(SendChatUseCase::new(repository.clone(), clock.clone()));
    let leave_room_usecase = Arc::new(LeaveRoomUseCase::new(repository.clone(), clock.clone()));
    let get_stats_usecase = Arc::new(GetStatsUseCase::new(repository));

    // 3. Create MessageRouter
    let message_router = Arc::new(MessageRouter::new(
        join_room_usecase,
        relay_signal_usecase,
        send_chat_usecase,
        clock.clone(),
        config.max_frame_bytes,
    ));

    // 4. Create AppState
    let state = Arc::new(AppState {
        message_router,
        leave_room_usecase,
        get_stats_usecase,
        connection_tracker: Arc::new(ConnectionTracker::new()),
        clock,
    });

    // 5. Create the server
    Server::new(state, config)
}
