//! Tic-tac-toe WebSocket game server.
//!
//! Each connection gets its own independent game; the server owns the
//! computer opponent's thinking delay.

use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod protocol;
mod server;
mod session;

use config::ServerConfig;
use server::ServerState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env()?;

    info!(
        addr = %config.addr,
        base_ms = config.thinking_delay.base_ms,
        jitter_ms = config.thinking_delay.jitter_ms,
        "Starting tic-tac-toe server..."
    );

    let state = Arc::new(ServerState::new(config.clone()));

    server::run_server(config.addr, state).await
}
