// src/server/connection_loop.rs

//! Contains the main server loop that serves HTTP and handles graceful shutdown.

use super::context::ServerContext;
use super::routes;
use anyhow::{Context, Result, anyhow};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::signal::unix::{SignalKind, signal};
use tracing::{error, info, warn};

/// Serves the router until a signal arrives or a background task fails, then
/// shuts everything down.
pub async fn run(mut ctx: ServerContext) -> Result<()> {
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow!("Failed to register SIGINT handler: {}", e))?;
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow!("Failed to register SIGTERM handler: {}", e))?;

    let app = routes::router(ctx.state.clone());
    let mut shutdown_rx = ctx.shutdown_tx.subscribe();
    let server = axum::serve(
        ctx.listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move {
        shutdown_rx.recv().await.ok();
    });
    let mut server_task = tokio::spawn(async move { server.await });

    let mut server_finished = false;
    tokio::select! {
        biased;

        _ = sigint.recv() => {
            info!("SIGINT received, initiating graceful shutdown.");
        }
        _ = sigterm.recv() => {
            info!("SIGTERM received, initiating graceful shutdown.");
        }

        Some(res) = ctx.background_tasks.join_next() => {
            match res {
                Ok(Ok(())) => warn!("A background task finished unexpectedly without an error."),
                Ok(Err(e)) => error!("CRITICAL: Background task failed: {}. Shutting down.", e),
                Err(e) => error!("CRITICAL: Background task panicked: {e:?}. Shutting down."),
            }
        }

        res = &mut server_task => {
            server_finished = true;
            match res {
                Ok(Ok(())) => warn!("HTTP server stopped unexpectedly."),
                Ok(Err(e)) => error!("CRITICAL: HTTP server failed: {}. Shutting down.", e),
                Err(e) => error!("CRITICAL: HTTP server panicked: {e:?}. Shutting down."),
            }
        }
    }

    info!("Shutting down. Sending signal to all tasks.");
    if ctx.shutdown_tx.send(()).is_err() {
        warn!("No task was listening for the shutdown signal.");
    }

    // Upgraded sockets are detached from the HTTP server, so close them here.
    let closed = ctx.state.close_all();
    info!("Closed {} open connection(s).", closed);

    if !server_finished {
        match tokio::time::timeout(Duration::from_secs(10), server_task).await {
            Ok(res) => res
                .context("HTTP server task panicked")?
                .context("HTTP server failed during shutdown")?,
            Err(_) => warn!("Timed out waiting for the HTTP server to stop."),
        }
    }

    info!("Waiting for background tasks to finish...");
    if tokio::time::timeout(Duration::from_secs(10), async {
        while ctx.background_tasks.join_next().await.is_some() {}
    })
    .await
    .is_err()
    {
        warn!("Timed out waiting for background tasks to finish cleanly.");
    };
    info!(
        "Server shutdown complete. Served {} connections and {} commands.",
        ctx.state.stats.get_total_connections(),
        ctx.state.stats.get_total_commands()
    );
    Ok(())
}
