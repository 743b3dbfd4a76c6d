// src/connection/guard.rs

//! Defines `ConnectionGuard`, the exactly-once teardown shared by a
//! connection's reader and dispatcher.

use crate::core::registry::ConnectionRecord;
use crate::core::state::HubState;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::watch;
use tracing::{debug, info};

/// Why a connection was torn down.
#[derive(Debug, Clone, PartialEq)]
pub enum TeardownReason {
    /// The peer sent a close frame.
    PeerClosed,
    /// No frame arrived before the liveness deadline.
    LivenessTimeout,
    /// Reading from the transport failed.
    ReadFailed(String),
    /// Writing to the transport failed or exceeded the write deadline.
    WriteFailed(String),
    /// The outbound queue was closed because the record left the registry.
    QueueClosed,
    /// The sibling loop tore the connection down first.
    SiblingExited,
    /// The guard was dropped without an explicit teardown.
    Dropped,
}

impl fmt::Display for TeardownReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TeardownReason::PeerClosed => write!(f, "closed by peer"),
            TeardownReason::LivenessTimeout => write!(f, "liveness deadline expired"),
            TeardownReason::ReadFailed(e) => write!(f, "read failed: {e}"),
            TeardownReason::WriteFailed(e) => write!(f, "write failed: {e}"),
            TeardownReason::QueueClosed => write!(f, "outbound queue closed"),
            TeardownReason::SiblingExited => write!(f, "sibling loop exited"),
            TeardownReason::Dropped => write!(f, "handler dropped"),
        }
    }
}

/// Tears a connection down exactly once, whichever loop gets there first.
///
/// Teardown removes this connection's own record from the registry, which
/// closes its outbound queue and wakes the dispatcher, and flips the done signal that the reader
/// selects on. `Drop` runs the same path so an abandoned handler never leaves
/// a dangling registry entry.
pub struct ConnectionGuard {
    state: Arc<HubState>,
    record: Arc<ConnectionRecord>,
    torn_down: AtomicBool,
    reason: Mutex<Option<TeardownReason>>,
    done_tx: watch::Sender<bool>,
}

impl ConnectionGuard {
    pub(crate) fn new(state: Arc<HubState>, record: Arc<ConnectionRecord>) -> Self {
        let (done_tx, _) = watch::channel(false);
        Self {
            state,
            record,
            torn_down: AtomicBool::new(false),
            reason: Mutex::new(None),
            done_tx,
        }
    }

    /// A receiver that observes `true` once the connection has been torn down.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.done_tx.subscribe()
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down.load(Ordering::Acquire)
    }

    /// The reason given by the call that actually tore the connection down.
    pub fn reason(&self) -> Option<TeardownReason> {
        self.reason.lock().clone()
    }

    /// Performs teardown. Returns true only for the call that actually did it.
    pub fn teardown(&self, reason: &TeardownReason) -> bool {
        if self.torn_down.swap(true, Ordering::AcqRel) {
            debug!(
                "[{}] Teardown already done, ignoring second trigger ({})",
                self.record.address(),
                reason
            );
            return false;
        }

        *self.reason.lock() = Some(reason.clone());
        // The address may already belong to a newer connection.
        self.state.registry.remove_record(&self.record);
        self.done_tx.send_replace(true);
        info!("[{}] Connection closed: {}", self.record.address(), reason);
        true
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.teardown(&TeardownReason::Dropped);
    }
}
