// src/connection/dispatcher.rs

//! The outbound half of a connection: drains the outbound queue to the
//! transport and sends periodic liveness probes.

use super::guard::{ConnectionGuard, TeardownReason};
use crate::core::HubError;
use crate::core::metrics;
use crate::core::protocol::{ControlFrame, LINE_DELIMITER};
use crate::core::registry::OutboundReceiver;
use crate::transport::BoxedSink;
use bytes::{BufMut, Bytes, BytesMut};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{Instant, MissedTickBehavior, timeout};
use tracing::debug;

pub struct OutboundDispatcher {
    address: String,
    receiver: OutboundReceiver,
    sink: BoxedSink,
    guard: Arc<ConnectionGuard>,
    probe_interval: Duration,
    write_timeout: Duration,
}

impl OutboundDispatcher {
    pub(crate) fn new(
        address: String,
        receiver: OutboundReceiver,
        sink: BoxedSink,
        guard: Arc<ConnectionGuard>,
        probe_interval: Duration,
        write_timeout: Duration,
    ) -> Self {
        Self {
            address,
            receiver,
            sink,
            guard,
            probe_interval,
            write_timeout,
        }
    }

    /// Runs until the queue is closed or a write fails. This loop is the only
    /// owner of the write half and closes it exactly once on the way out.
    pub async fn run(mut self) -> TeardownReason {
        debug!("[{}] Starting dispatcher", self.address);

        let mut ticker =
            tokio::time::interval_at(Instant::now() + self.probe_interval, self.probe_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let reason = loop {
            tokio::select! {
                maybe_payload = self.receiver.recv() => {
                    let Some(first) = maybe_payload else {
                        // The record left the registry. Say goodbye; the peer may
                        // already be gone, so a failure here changes nothing.
                        if let Err(e) = self.write_control(ControlFrame::Close).await {
                            debug!("[{}] Could not send close frame: {}", self.address, e);
                        }
                        break TeardownReason::QueueClosed;
                    };
                    let batch = self.coalesce(first);
                    if let Err(e) = self.write_data(batch).await {
                        break TeardownReason::WriteFailed(e.to_string());
                    }
                }
                _ = ticker.tick() => {
                    debug!("[{}] Sending liveness probe", self.address);
                    if let Err(e) = self.write_control(ControlFrame::Ping).await {
                        break TeardownReason::WriteFailed(e.to_string());
                    }
                    metrics::PROBES_SENT_TOTAL.inc();
                }
            }
        };

        self.guard.teardown(&reason);
        match timeout(self.write_timeout, self.sink.close()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => debug!("[{}] Error closing transport: {}", self.address, e),
            Err(_) => debug!("[{}] Timed out closing transport", self.address),
        }
        reason
    }

    /// Joins `first` with every payload already waiting in the queue,
    /// separated by newlines. Payloads enqueued after this call starts are
    /// left for the next frame.
    fn coalesce(&mut self, first: Bytes) -> Bytes {
        let pending = self.receiver.len();
        if pending == 0 {
            return first;
        }

        let mut batch = BytesMut::with_capacity(first.len() * (pending + 1));
        batch.extend_from_slice(&first);
        for _ in 0..pending {
            let Ok(next) = self.receiver.try_recv() else {
                break;
            };
            batch.put_u8(LINE_DELIMITER);
            batch.extend_from_slice(&next);
        }
        batch.freeze()
    }

    async fn write_data(&mut self, payload: Bytes) -> Result<(), HubError> {
        timeout(self.write_timeout, self.sink.write_frame(payload)).await??;
        metrics::FRAMES_WRITTEN_TOTAL.inc();
        Ok(())
    }

    async fn write_control(&mut self, frame: ControlFrame) -> Result<(), HubError> {
        timeout(self.write_timeout, self.sink.write_control(frame)).await?
    }
}
