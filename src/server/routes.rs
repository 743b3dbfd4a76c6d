// src/server/routes.rs

//! The hub's HTTP surface: the WebSocket upgrade and the participants listing.

use crate::connection::ConnectionHandler;
use crate::core::protocol::{ControlFrame, Participant};
use crate::core::state::HubState;
use crate::transport::FrameSink;
use crate::transport::websocket::{self, WsSink};
use axum::extract::ws::{WebSocket, WebSocketUpgrade};
use axum::extract::{ConnectInfo, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::OwnedSemaphorePermit;
use tracing::{debug, info, warn};

pub fn router(state: Arc<HubState>) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .route("/participants", get(participants_handler))
        .with_state(state)
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    State(state): State<Arc<HubState>>,
) -> Response {
    let Ok(permit) = state.connection_permits.clone().try_acquire_owned() else {
        warn!(
            "Rejecting connection from {}: max_clients ({}) reached",
            addr, state.config.max_clients
        );
        return (StatusCode::SERVICE_UNAVAILABLE, "max clients reached").into_response();
    };

    info!("Accepted new connection from: {}", addr);
    ws.max_message_size(state.config.hub.max_message_size)
        .on_upgrade(move |socket| serve_socket(state, addr, socket, permit))
}

/// Serves one upgraded socket until it dies. The permit is held for the
/// lifetime of the connection.
async fn serve_socket(
    state: Arc<HubState>,
    addr: SocketAddr,
    socket: WebSocket,
    _permit: OwnedSemaphorePermit,
) {
    let address = addr.to_string();
    let (source, sink) = websocket::split(socket);

    let handler = match ConnectionHandler::register(state, &address) {
        Ok(handler) => handler,
        Err(e) => {
            warn!("Rejecting connection from {}: {}", address, e);
            refuse(sink).await;
            return;
        }
    };

    let reason = handler.run(source, sink).await;
    debug!("[{}] Connection task finished: {}", address, reason);
}

async fn refuse(mut sink: WsSink) {
    if let Err(e) = sink.write_control(ControlFrame::Close).await {
        debug!("Could not send close frame to refused connection: {}", e);
    }
    if let Err(e) = sink.close().await {
        debug!("Error closing refused connection: {}", e);
    }
}

async fn participants_handler(State(state): State<Arc<HubState>>) -> Json<Vec<Participant>> {
    Json(state.registry.participants())
}
