//! Arena Relay Server - authoritative multiplayer combat/session relay
//!
//! This is the main entry point for the relay server. It handles:
//! - WebSocket connections carrying join/move/shoot/damage intents
//! - Room-scoped broadcast of player state and kill events
//! - Death, respawn and elimination sequencing
//! - A health endpoint for the hosting platform

mod app;
mod config;
mod game;
mod http;
mod util;
mod ws;

use std::future::{Future, IntoFuture};
use std::io;
use std::net::SocketAddr;

use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::app::AppState;
use crate::config::Config;
use crate::http::build_router;
use crate::util::time::init_server_time;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Config::from_env()?;

    // Initialize tracing
    init_tracing(&config.log_level);

    // Initialize server time tracking
    init_server_time();

    info!("Starting Arena Relay Server");
    info!(
        death_limit = config.arena.death_limit,
        respawn_delay_ms = config.arena.respawn_delay.as_millis() as u64,
        default_room = %config.arena.default_room,
        "Arena rules loaded"
    );

    // Create application state and spawn the arena event loop
    let (state, arena) = AppState::new(config.clone());
    let arena_task = tokio::spawn(arena.run());

    // Build router
    let router = build_router(state);

    // Start server
    let addr: SocketAddr = config.server_addr;
    let listener = TcpListener::bind(addr).await?;

    info!("Server listening on {}", addr);
    info!("Health check: http://{}/health", addr);
    info!("WebSocket endpoint: ws://{}/ws", addr);

    let server = axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .into_future();
    serve_until_exit(server, arena_task).await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Run the HTTP server, stopping it if the arena task ends first.
///
/// Without the arena every socket would be accepted and then starved.
async fn serve_until_exit<S>(server: S, arena_task: JoinHandle<()>) -> anyhow::Result<()>
where
    S: Future<Output = io::Result<()>>,
{
    tokio::select! {
        result = server => Ok(result?),
        result = arena_task => {
            match result {
                Ok(()) => error!("Arena task exited"),
                Err(e) => error!(error = %e, "Arena task failed"),
            }
            anyhow::bail!("arena task stopped, shutting down")
        }
    }
}

/// Initialize tracing/logging
fn init_tracing(log_level: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        }
        _ = terminate => {
            info!("Received terminate signal, starting graceful shutdown");
        }
    }
}
