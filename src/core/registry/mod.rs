// src/core/registry/mod.rs

//! The authoritative table of live connections.
//!
//! All mutations happen under a single write lock, so `list` always observes
//! a linearizable snapshot and `create`/`remove` can never interleave.

mod record;

pub use record::{ConnectionRecord, OutboundReceiver, UNIDENTIFIED};

use crate::config::HubConfig;
use crate::core::HubError;
use crate::core::protocol::Participant;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// A concurrent map from connection address to its record.
#[derive(Debug)]
pub struct ConnectionRegistry {
    connections: RwLock<HashMap<String, Arc<ConnectionRecord>>>,
    queue_capacity: usize,
    liveness_timeout: Duration,
}

impl ConnectionRegistry {
    /// A zero `queue_capacity` is raised to one slot.
    pub fn new(queue_capacity: usize, liveness_timeout: Duration) -> Self {
        let queue_capacity = if queue_capacity == 0 {
            warn!("Outbound queue capacity 0 is not supported; using 1");
            1
        } else {
            queue_capacity
        };
        Self {
            connections: RwLock::new(HashMap::new()),
            queue_capacity,
            liveness_timeout,
        }
    }

    pub fn from_config(config: &HubConfig) -> Self {
        Self::new(config.outbound_queue_capacity, config.liveness_timeout)
    }

    /// Registers an empty record for `address`.
    ///
    /// An address that is already live is rejected with `DuplicateAddress`;
    /// the existing connection is left untouched.
    pub fn create(&self, address: &str) -> Result<Arc<ConnectionRecord>, HubError> {
        let mut connections = self.connections.write();
        match connections.entry(address.to_string()) {
            Entry::Occupied(_) => Err(HubError::DuplicateAddress(address.to_string())),
            Entry::Vacant(slot) => {
                let record = Arc::new(ConnectionRecord::new(
                    address.to_string(),
                    self.queue_capacity,
                    self.liveness_timeout,
                ));
                slot.insert(record.clone());
                debug!("Registered connection {}", address);
                Ok(record)
            }
        }
    }

    /// Removes `address` and closes its outbound queue.
    ///
    /// Removing an absent address is a no-op. Returns whether a record was removed.
    pub fn remove(&self, address: &str) -> bool {
        let removed = self.connections.write().remove(address);
        match removed {
            Some(record) => {
                record.close_outbound();
                debug!("Removed connection {}", address);
                true
            }
            None => false,
        }
    }

    /// Removes `record` only if it is still the one registered under its
    /// address. A stale record whose address was freed and reused leaves the
    /// newer connection alone.
    pub fn remove_record(&self, record: &Arc<ConnectionRecord>) -> bool {
        let removed = {
            let mut connections = self.connections.write();
            match connections.get(record.address()) {
                Some(live) if Arc::ptr_eq(live, record) => connections.remove(record.address()),
                _ => None,
            }
        };
        // Closing is idempotent, so a stale record still gets its queue closed.
        record.close_outbound();
        match removed {
            Some(_) => {
                debug!("Removed connection {}", record.address());
                true
            }
            None => false,
        }
    }

    pub fn find(&self, address: &str) -> Option<Arc<ConnectionRecord>> {
        self.connections.read().get(address).cloned()
    }

    pub fn contains(&self, address: &str) -> bool {
        self.connections.read().contains_key(address)
    }

    /// Returns a snapshot of every live record. Later registry mutations are
    /// not reflected in the returned vector.
    pub fn list(&self) -> Vec<Arc<ConnectionRecord>> {
        self.connections.read().values().cloned().collect()
    }

    /// Every live connection as a participant, ordered by address.
    pub fn participants(&self) -> Vec<Participant> {
        let mut users: Vec<Participant> = self
            .connections
            .read()
            .values()
            .map(|record| record.participant())
            .collect();
        users.sort_by(|a, b| a.address.cmp(&b.address));
        users
    }

    pub fn len(&self) -> usize {
        self.connections.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.read().is_empty()
    }
}
