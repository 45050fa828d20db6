//! WebSocket connection handlers.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade, rejection::WebSocketUpgradeRejection},
    },
    response::{IntoResponse, Response},
};
use futures_util::{
    sink::SinkExt,
    stream::{SplitSink, SplitStream, StreamExt},
};
use tokio::sync::mpsc;

use crate::{
    domain::{ConnectionState, LeaveOutcome, OutboundEvent, Timestamp},
    infrastructure::dto::websocket::ServerMessage,
    ui::{heartbeat::ConnectionControl, state::AppState},
};

use super::http::health_check;

/// `GET /ws`
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// `GET /`: upgrade if the client asked for it, otherwise report health
pub async fn root_handler(
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
    State(state): State<Arc<AppState>>,
) -> Response {
    match ws {
        Ok(ws) => ws
            .on_upgrade(move |socket| handle_socket(socket, state))
            .into_response(),
        Err(_) => health_check(State(state)).await.into_response(),
    }
}

/// Spawns the writer task for one connection.
///
/// Drains outbound events into the socket as JSON text frames and obeys
/// heartbeat control requests. Returning drops the sink half of the socket.
fn pusher_loop(
    mut outbox: mpsc::UnboundedReceiver<OutboundEvent>,
    mut control: mpsc::UnboundedReceiver<ConnectionControl>,
    mut sender: SplitSink<WebSocket, Message>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                event = outbox.recv() => {
                    let Some(event) = event else { break };
                    let json = match serde_json::to_string(&ServerMessage::from(event)) {
                        Ok(json) => json,
                        Err(e) => {
                            tracing::error!("Failed to serialize outbound frame: {}", e);
                            continue;
                        }
                    };
                    if sender.send(Message::Text(json.into())).await.is_err() {
                        break;
                    }
                }
                command = control.recv() => match command {
                    Some(ConnectionControl::Ping) => {
                        if sender.send(Message::Ping(Bytes::new())).await.is_err() {
                            break;
                        }
                    }
                    Some(ConnectionControl::Terminate) | None => break,
                },
            }
        }
    })
}

/// Reads frames until the peer closes or the transport fails
async fn receive_loop(
    receiver: &mut SplitStream<WebSocket>,
    connection: &mut ConnectionState,
    state: &AppState,
) {
    while let Some(msg) = receiver.next().await {
        let msg = match msg {
            Ok(msg) => msg,
            Err(e) => {
                tracing::error!("WebSocket error on connection '{}': {}", connection.id(), e);
                break;
            }
        };

        match msg {
            Message::Text(text) => {
                state
                    .message_router
                    .handle_frame(connection, text.as_str().as_bytes())
                    .await;
            }
            Message::Binary(bytes) => {
                state.message_router.handle_frame(connection, &bytes).await;
            }
            Message::Pong(_) => {
                let now = Timestamp::new(state.clock.now_millis());
                state
                    .connection_tracker
                    .mark_alive(&connection.id(), now)
                    .await;
            }
            Message::Ping(_) => {
                // axum answers pings automatically
            }
            Message::Close(_) => {
                tracing::info!("Connection '{}' requested close", connection.id());
                break;
            }
        }
    }
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (sender, mut receiver) = socket.split();
    let (outbox_tx, outbox_rx) = mpsc::unbounded_channel();
    let (control_tx, control_rx) = mpsc::unbounded_channel();

    let mut connection = ConnectionState::new(outbox_tx);
    let connection_id = connection.id();
    state
        .connection_tracker
        .register(
            connection_id,
            control_tx,
            Timestamp::new(state.clock.now_millis()),
        )
        .await;
    tracing::info!("Connection '{}' opened", connection_id);

    let mut send_task = pusher_loop(outbox_rx, control_rx, sender);

    // If either side finishes, stop the other
    tokio::select! {
        _ = receive_loop(&mut receiver, &mut connection, &state) => send_task.abort(),
        _ = &mut send_task => {},
    };

    // Socket close and heartbeat termination share this path
    match state.leave_room_usecase.execute(&mut connection).await {
        Ok(LeaveOutcome::Left { room_removed, .. }) => {
            tracing::debug!(
                "Connection '{}' cleaned up (room removed: {})",
                connection_id,
                room_removed
            );
        }
        Ok(LeaveOutcome::NotPresent) => {}
        Err(e) => {
            tracing::error!("Failed to clean up connection '{}': {}", connection_id, e);
        }
    }
    state.connection_tracker.unregister(&connection_id).await;
    tracing::info!("Connection '{}' closed", connection_id);
}
