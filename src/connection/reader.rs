// src/connection/reader.rs

//! The inbound half of a connection: reads frames, keeps the liveness
//! deadline fresh, and executes decoded commands.

use super::guard::{ConnectionGuard, TeardownReason};
use crate::core::metrics;
use crate::core::protocol::{self, InboundFrame};
use crate::core::registry::ConnectionRecord;
use crate::core::state::HubState;
use crate::transport::BoxedSource;
use std::sync::Arc;
use tracing::{debug, error, trace, warn};

pub struct InboundReader {
    state: Arc<HubState>,
    record: Arc<ConnectionRecord>,
    source: BoxedSource,
    guard: Arc<ConnectionGuard>,
}

impl InboundReader {
    pub(crate) fn new(
        state: Arc<HubState>,
        record: Arc<ConnectionRecord>,
        source: BoxedSource,
        guard: Arc<ConnectionGuard>,
    ) -> Self {
        Self {
            state,
            record,
            source,
            guard,
        }
    }

    /// Runs until the transport fails, the peer closes, the liveness deadline
    /// passes, or the dispatcher tears the connection down.
    pub async fn run(mut self) -> TeardownReason {
        let address = self.record.address().to_string();
        debug!("[{}] Starting reader", address);

        let mut done_rx = self.guard.subscribe();
        self.record.refresh_liveness();

        let reason = loop {
            // Checked after subscribing, so a teardown that lands before the
            // select is still seen through `changed`.
            if self.guard.is_torn_down() {
                break TeardownReason::SiblingExited;
            }
            let read = tokio::select! {
                biased;
                _ = done_rx.changed() => break TeardownReason::SiblingExited,
                read = tokio::time::timeout_at(
                    self.record.liveness_deadline(),
                    self.source.read_frame(),
                ) => read,
            };

            let frame = match read {
                Err(_elapsed) => {
                    metrics::LIVENESS_TIMEOUTS_TOTAL.inc();
                    break TeardownReason::LivenessTimeout;
                }
                Ok(Err(e)) => break TeardownReason::ReadFailed(e.to_string()),
                Ok(Ok(frame)) => frame,
            };

            // Any traffic at all proves the peer is alive.
            self.record.refresh_liveness();

            match frame {
                InboundFrame::Data(payload) => self.handle_payload(&address, &payload),
                InboundFrame::Pong(_) => trace!("[{}] Connection alive", address),
                InboundFrame::Ping(_) => trace!("[{}] Received ping", address),
                InboundFrame::Close => break TeardownReason::PeerClosed,
            }
        };

        self.guard.teardown(&reason);
        reason
    }

    /// Decodes and executes one payload. Undecodable payloads are logged and
    /// dropped; the sender is not told.
    fn handle_payload(&self, address: &str, payload: &[u8]) {
        trace!("[{}] {}", address, String::from_utf8_lossy(payload));

        let command = match protocol::decode(address, payload) {
            Ok(command) => command,
            Err(e) => {
                metrics::DECODE_ERRORS_TOTAL.inc();
                self.state.stats.increment_decode_errors();
                warn!("[{}] Dropping inbound frame: {}", address, e);
                return;
            }
        };

        debug!("[{}] Executing '{}'", address, command.name());
        self.state.stats.increment_total_commands();
        let ctx = self.state.execution_context();
        match command.execute(&ctx) {
            Ok(delivery) => trace!(
                "[{}] '{}' delivered to {}/{} recipients",
                address,
                command.name(),
                delivery.delivered,
                delivery.attempted()
            ),
            Err(e) => error!("[{}] '{}' failed: {}", address, command.name(), e),
        }
    }
}
