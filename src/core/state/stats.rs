// src/core/state/stats.rs

//! Contains state definitions and logic for hub statistics.

use std::sync::atomic::{AtomicU64, Ordering};

/// Holds all hub-wide counters that are reported outside of Prometheus.
#[derive(Debug)]
pub struct StatsState {
    /// The total number of connections accepted since startup.
    total_connections: AtomicU64,
    /// The total number of commands executed since startup.
    total_commands: AtomicU64,
    /// The total number of inbound payloads dropped as undecodable.
    total_decode_errors: AtomicU64,
}

impl Default for StatsState {
    fn default() -> Self {
        Self::new()
    }
}

impl StatsState {
    pub fn new() -> Self {
        Self {
            total_connections: AtomicU64::new(0),
            total_commands: AtomicU64::new(0),
            total_decode_errors: AtomicU64::new(0),
        }
    }

    pub fn increment_total_connections(&self) {
        self.total_connections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_total_connections(&self) -> u64 {
        self.total_connections.load(Ordering::Relaxed)
    }

    pub fn increment_total_commands(&self) {
        self.total_commands.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_total_commands(&self) -> u64 {
        self.total_commands.load(Ordering::Relaxed)
    }

    pub fn increment_decode_errors(&self) {
        self.total_decode_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_decode_errors(&self) -> u64 {
        self.total_decode_errors.load(Ordering::Relaxed)
    }
}
