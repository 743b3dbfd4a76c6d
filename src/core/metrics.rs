// src/core/metrics.rs

//! Defines and registers Prometheus metrics for hub monitoring.
//!
//! This module uses `lazy_static` to ensure that metrics are registered only once
//! globally for the entire application lifecycle.

use lazy_static::lazy_static;
use prometheus::{
    Counter, CounterVec, Gauge, TextEncoder, register_counter, register_counter_vec,
    register_gauge,
};

lazy_static! {
    // --- Connection Gauges ---
    /// The number of connections currently registered in the hub.
    pub static ref CONNECTED_CLIENTS: Gauge =
        register_gauge!("relayhub_connected_clients", "Number of currently connected clients.").unwrap();

    // --- Connection Counters ---
    /// The total number of connections accepted since startup.
    pub static ref CONNECTIONS_RECEIVED_TOTAL: Counter =
        register_counter!("relayhub_connections_received_total", "Total number of connections received.").unwrap();
    /// Connections rejected because their address was already registered.
    pub static ref CONNECTIONS_REJECTED_TOTAL: Counter =
        register_counter!("relayhub_connections_rejected_total", "Total number of connections rejected at registration.").unwrap();
    /// Connections torn down because the peer stopped answering within the liveness timeout.
    pub static ref LIVENESS_TIMEOUTS_TOTAL: Counter =
        register_counter!("relayhub_liveness_timeouts_total", "Total number of connections closed for missing the liveness deadline.").unwrap();

    // --- Command Counters ---
    /// Commands executed, labeled by action.
    pub static ref COMMANDS_PROCESSED_TOTAL: CounterVec =
        register_counter_vec!("relayhub_commands_processed_total", "Total number of commands processed, labeled by action.", &["action"]).unwrap();
    /// Inbound payloads that could not be decoded and were dropped.
    pub static ref DECODE_ERRORS_TOTAL: Counter =
        register_counter!("relayhub_decode_errors_total", "Total number of inbound payloads dropped as undecodable.").unwrap();
    /// Envelopes enqueued onto a recipient's outbound queue.
    pub static ref ENVELOPES_DELIVERED_TOTAL: Counter =
        register_counter!("relayhub_envelopes_delivered_total", "Total number of envelopes enqueued for delivery.").unwrap();
    /// Envelopes dropped because a recipient's queue was full or closed.
    pub static ref ENVELOPES_DROPPED_TOTAL: Counter =
        register_counter!("relayhub_envelopes_dropped_total", "Total number of envelopes dropped for unavailable recipients.").unwrap();

    // --- Transport Counters ---
    /// Outbound frames written to transports (coalesced batches count once).
    pub static ref FRAMES_WRITTEN_TOTAL: Counter =
        register_counter!("relayhub_frames_written_total", "Total number of outbound data frames written.").unwrap();
    /// Liveness probes sent to peers.
    pub static ref PROBES_SENT_TOTAL: Counter =
        register_counter!("relayhub_probes_sent_total", "Total number of liveness probes sent.").unwrap();
}

/// Gathers all registered metrics and encodes them in the Prometheus text format.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    encoder
        .encode_to_string(&metric_families)
        .unwrap_or_default()
}
