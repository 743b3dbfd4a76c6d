// src/core/registry/record.rs

//! Defines `ConnectionRecord`, the server-side state tracked for one live connection.

use crate::core::HubError;
use crate::core::protocol::Participant;
use bytes::Bytes;
use parking_lot::{Mutex, RwLock};
use std::time::Duration;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::time::Instant;

/// The name reported for a connection that never identified itself.
pub const UNIDENTIFIED: &str = "unidentified";

/// The receiving half of a connection's outbound queue, owned by its dispatcher.
pub type OutboundReceiver = mpsc::Receiver<Bytes>;

/// Per-connection state: identity, outbound queue and liveness clock.
///
/// Records are only handed out by the `ConnectionRegistry`. The outbound
/// sender lives behind a lock so that `close_outbound` can drop it, which is
/// what wakes the dispatcher once the connection has been removed.
#[derive(Debug)]
pub struct ConnectionRecord {
    address: String,
    display_name: RwLock<Option<String>>,
    outbound_tx: Mutex<Option<mpsc::Sender<Bytes>>>,
    outbound_rx: Mutex<Option<OutboundReceiver>>,
    liveness_timeout: Duration,
    liveness_deadline: Mutex<Instant>,
}

impl ConnectionRecord {
    pub(crate) fn new(address: String, queue_capacity: usize, liveness_timeout: Duration) -> Self {
        let (tx, rx) = mpsc::channel(queue_capacity);
        Self {
            address,
            display_name: RwLock::new(None),
            outbound_tx: Mutex::new(Some(tx)),
            outbound_rx: Mutex::new(Some(rx)),
            liveness_timeout,
            liveness_deadline: Mutex::new(Instant::now() + liveness_timeout),
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    /// Returns the display name, or `"unidentified"` if none was set.
    pub fn display_name(&self) -> String {
        self.display_name
            .read()
            .clone()
            .unwrap_or_else(|| UNIDENTIFIED.to_string())
    }

    pub fn set_display_name(&self, name: impl Into<String>) {
        *self.display_name.write() = Some(name.into());
    }

    /// Deposits a payload onto the outbound queue without waiting.
    ///
    /// A full or closed queue is reported as `RecipientUnavailable` and the
    /// payload is dropped for this recipient only.
    pub fn enqueue(&self, payload: Bytes) -> Result<(), HubError> {
        let guard = self.outbound_tx.lock();
        let Some(tx) = guard.as_ref() else {
            return Err(self.unavailable("outbound queue closed"));
        };
        match tx.try_send(payload) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => Err(self.unavailable("outbound queue full")),
            Err(TrySendError::Closed(_)) => Err(self.unavailable("dispatcher has exited")),
        }
    }

    /// Hands the receiving half of the queue to the dispatcher. Returns `None`
    /// on every call after the first.
    pub fn take_outbound_receiver(&self) -> Option<OutboundReceiver> {
        self.outbound_rx.lock().take()
    }

    /// Drops the sending half so the dispatcher observes a closed queue once it
    /// has drained what was already enqueued.
    pub(crate) fn close_outbound(&self) {
        self.outbound_tx.lock().take();
    }

    pub fn is_closed(&self) -> bool {
        self.outbound_tx
            .lock()
            .as_ref()
            .is_none_or(|tx| tx.is_closed())
    }

    /// Number of payloads currently waiting in the outbound queue.
    pub fn queued(&self) -> usize {
        self.outbound_tx
            .lock()
            .as_ref()
            .map(|tx| tx.max_capacity() - tx.capacity())
            .unwrap_or(0)
    }

    /// Pushes the liveness deadline to `now + liveness_timeout` and returns it.
    pub fn refresh_liveness(&self) -> Instant {
        let deadline = Instant::now() + self.liveness_timeout;
        *self.liveness_deadline.lock() = deadline;
        deadline
    }

    pub fn liveness_deadline(&self) -> Instant {
        *self.liveness_deadline.lock()
    }

    /// The public view of this record used in `whoall` envelopes.
    pub fn participant(&self) -> Participant {
        Participant {
            address: self.address.clone(),
            name: self.display_name(),
        }
    }

    fn unavailable(&self, reason: &str) -> HubError {
        HubError::RecipientUnavailable {
            address: self.address.clone(),
            reason: reason.to_string(),
        }
    }
}
