//! Server execution logic.

use std::{future::Future, sync::Arc};

use axum::{
    Router,
    http::{HeaderValue, Method},
    routing::get,
};
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::RelayConfig;

use super::{
    handler::{get_stats, root_handler, websocket_handler},
    heartbeat::HeartbeatMonitor,
    signal::shutdown_signal,
    state::AppState,
};

pub type ServerError = Box<dyn std::error::Error + Send + Sync>;

/// WebRTC signaling relay server
///
/// # Example
///
/// ```ignore
/// let server = bootstrap::build_server(RelayConfig::default(), Arc::new(SystemClock));
/// server.run("0.0.0.0".to_string(), 8080).await?;
/// ```
pub struct Server {
    state: Arc<AppState>,
    config: RelayConfig,
}

impl Server {
    pub fn new(state: Arc<AppState>, config: RelayConfig) -> Self {
        Self { state, config }
    }

    /// Build the axum router with CORS and request tracing
    pub fn router(&self) -> Result<Router, ServerError> {
        let app = Router::new()
            // WebSocket エンドポイント（`/` は upgrade が無ければヘルスチェック）
            .route("/", get(root_handler))
            .route("/ws", get(websocket_handler))
            // HTTP エンドポイント
            .route("/api/stats", get(get_stats))
            .layer(build_cors_layer(&self.config.cors_origin)?)
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone());
        Ok(app)
    }

    /// Bind to `host:port` and serve until Ctrl+C or SIGTERM
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind to the specified address or
    /// if there's an error during server execution.
    pub async fn run(self, host: String, port: u16) -> Result<(), ServerError> {
        let bind_addr = format!("{}:{}", host, port);
        let listener = TcpListener::bind(&bind_addr).await?;

        tracing::info!(
            "Signaling relay listening on {}",
            listener.local_addr()?
        );
        tracing::info!("Connect to: ws://{}/ws", bind_addr);
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        self.serve(listener, shutdown_signal()).await
    }

    /// Serve on an already bound listener until `shutdown` resolves
    ///
    /// # Errors
    ///
    /// Fails before serving if the heartbeat interval is zero or the CORS
    /// origin is not a valid header value.
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if self.config.heartbeat_interval.is_zero() {
            return Err("heartbeat interval must be greater than zero".into());
        }
        let app = self.router()?;
        let heartbeat = HeartbeatMonitor::spawn(
            self.state.connection_tracker.clone(),
            self.state.clock.clone(),
            self.config.heartbeat_interval,
            self.config.heartbeat_timeout,
        );

        let result = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await;
        heartbeat.abort();
        result?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }
}

fn build_cors_layer(origin: &str) -> Result<CorsLayer, ServerError> {
    let cors = CorsLayer::new().allow_methods([Method::GET, Method::POST]);
    if origin == "*" {
        return Ok(cors.allow_origin(Any));
    }
    Ok(cors.allow_origin(HeaderValue::from_str(origin)?))
}
