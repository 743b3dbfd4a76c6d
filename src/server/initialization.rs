// src/server/initialization.rs

//! Builds the shared hub state and binds the listener.

use super::context::ServerContext;
use crate::config::Config;
use crate::core::HubError;
use crate::core::state::HubState;
use anyhow::Result;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::task::JoinSet;
use tracing::info;

/// Initializes all server components before starting the main loop.
pub async fn setup(config: Config) -> Result<ServerContext> {
    log_startup_info(&config);
    let (shutdown_tx, _) = broadcast::channel(1);

    let host = config.host.clone();
    let port = config.port;
    let state = HubState::new(config);
    info!("Hub state initialized.");

    let listener = TcpListener::bind((host.as_str(), port))
        .await
        .map_err(|e| HubError::Startup(format!("failed to bind {host}:{port}: {e}")))?;
    info!("RelayHub listening on ws://{}:{}/ws", host, port);

    Ok(ServerContext {
        state,
        listener,
        shutdown_tx,
        background_tasks: JoinSet::new(),
    })
}

fn log_startup_info(config: &Config) {
    info!("Starting RelayHub v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Liveness timeout {:?}, probe interval {:?}, write timeout {:?}",
        config.hub.liveness_timeout, config.hub.probe_interval, config.hub.write_timeout
    );
    info!(
        "Outbound queue capacity {}, max message size {} bytes, max clients {}",
        config.hub.outbound_queue_capacity, config.hub.max_message_size, config.max_clients
    );
    if config.hub.echo_broadcast {
        info!("Broadcasts are echoed back to their sender.");
    }
}
