//! WebRTC signaling relay server.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin genkan-server
//! cargo run --bin genkan-server -- --host 127.0.0.1 --port 3000
//! ```

use std::{sync::Arc, time::Duration};

use clap::Parser;
use genkan_server::{bootstrap::build_server, config::RelayConfig};
use genkan_shared::{logger::setup_logger, time::SystemClock};

#[derive(Parser, Debug)]
#[command(name = "genkan-server")]
#[command(about = "WebRTC signaling relay with rooms and chat", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, env = "HOST", default_value = "0.0.0.0")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, env = "PORT", default_value = "8080")]
    port: u16,

    /// Default log level (overridden by RUST_LOG)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Allowed CORS origin (`*` for any)
    #[arg(long, env = "CORS_ORIGIN", default_value = "*")]
    cors_origin: String,

    /// Seconds between heartbeat pings
    #[arg(long, default_value = "30", value_parser = clap::value_parser!(u64).range(1..))]
    heartbeat_interval_secs: u64,

    /// Seconds of silence before a connection is terminated
    #[arg(long, default_value = "40")]
    heartbeat_timeout_secs: u64,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), &args.log_level);

    let config = RelayConfig {
        cors_origin: args.cors_origin,
        heartbeat_interval: Duration::from_secs(args.heartbeat_interval_secs),
        heartbeat_timeout: Duration::from_secs(args.heartbeat_timeout_secs),
        ..RelayConfig::default()
    };

    let server = build_server(config, Arc::new(SystemClock));
    if let Err(e) = server.run(args.host, args.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
