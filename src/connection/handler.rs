// src/connection/handler.rs

//! Defines the `ConnectionHandler` which manages the full lifecycle of a connection.

use super::dispatcher::OutboundDispatcher;
use super::guard::{ConnectionGuard, TeardownReason};
use super::reader::InboundReader;
use crate::core::metrics;
use crate::core::registry::ConnectionRecord;
use crate::core::state::HubState;
use crate::core::{HubError, protocol::ControlFrame};
use crate::transport::{BoxedSink, BoxedSource, FrameSink, FrameSource};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// A registered connection that is ready to be served.
///
/// `register` inserts the record into the registry; `run` spawns the reader
/// and dispatcher and waits for both to finish. Dropping a handler without
/// running it removes the record again.
pub struct ConnectionHandler {
    state: Arc<HubState>,
    record: Arc<ConnectionRecord>,
    guard: Arc<ConnectionGuard>,
}

impl ConnectionHandler {
    /// Registers `address` with the hub.
    pub fn register(state: Arc<HubState>, address: &str) -> Result<Self, HubError> {
        let record = match state.registry.create(address) {
            Ok(record) => record,
            Err(e) => {
                metrics::CONNECTIONS_REJECTED_TOTAL.inc();
                return Err(e);
            }
        };
        metrics::CONNECTIONS_RECEIVED_TOTAL.inc();
        state.stats.increment_total_connections();
        info!("[{}] Connection registered", address);

        let guard = Arc::new(ConnectionGuard::new(state.clone(), record.clone()));
        Ok(Self {
            state,
            record,
            guard,
        })
    }

    pub fn record(&self) -> &Arc<ConnectionRecord> {
        &self.record
    }

    /// Serves the connection until it dies, returning the reason of whichever
    /// loop tore it down first.
    pub async fn run<R, W>(self, source: R, sink: W) -> TeardownReason
    where
        R: FrameSource + 'static,
        W: FrameSink + 'static,
    {
        self.run_boxed(Box::new(source), Box::new(sink)).await
    }

    pub async fn run_boxed(self, source: BoxedSource, mut sink: BoxedSink) -> TeardownReason {
        let address = self.record.address().to_string();
        let Some(receiver) = self.record.take_outbound_receiver() else {
            error!("[{}] Outbound queue already taken; refusing to serve", address);
            if let Err(e) = sink.write_control(ControlFrame::Close).await {
                debug!("[{}] Failed to send close frame: {}", address, e);
            }
            if let Err(e) = sink.close().await {
                debug!("[{}] Error closing transport: {}", address, e);
            }
            let reason = TeardownReason::QueueClosed;
            self.guard.teardown(&reason);
            return reason;
        };

        let hub = &self.state.config.hub;
        let dispatcher = OutboundDispatcher::new(
            address.clone(),
            receiver,
            sink,
            self.guard.clone(),
            hub.probe_interval,
            hub.write_timeout,
        );
        let reader = InboundReader::new(
            self.state.clone(),
            self.record.clone(),
            source,
            self.guard.clone(),
        );

        let mut reader_task = tokio::spawn(reader.run());
        let mut dispatcher_task = tokio::spawn(dispatcher.run());

        let (first, reader_finished) = tokio::select! {
            res = &mut reader_task => (res, true),
            res = &mut dispatcher_task => (res, false),
        };
        let remaining = if reader_finished {
            dispatcher_task
        } else {
            reader_task
        };

        // A panicking loop never reaches its own teardown.
        let reason = match first {
            Ok(reason) => reason,
            Err(e) => {
                error!("[{}] Connection task panicked: {:?}", address, e);
                TeardownReason::Dropped
            }
        };
        self.guard.teardown(&reason);
        join_sibling(&address, remaining).await;
        // Both loops may have finished before this task was polled; the guard
        // knows which one got there first.
        self.guard.reason().unwrap_or(reason)
    }
}

async fn join_sibling(address: &str, task: JoinHandle<TeardownReason>) {
    if let Err(e) = task.await {
        if e.is_panic() {
            warn!("[{}] Sibling connection task panicked: {:?}", address, e);
        }
    }
}
