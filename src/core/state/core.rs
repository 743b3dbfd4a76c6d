// src/core/state/core.rs

//! Defines the central `HubState` struct, holding all shared hub-wide state.

use super::stats::StatsState;
use crate::config::Config;
use crate::core::commands::ExecutionContext;
use crate::core::registry::ConnectionRegistry;
use std::sync::Arc;
use tokio::sync::Semaphore;

/// The central struct holding all shared, hub-wide state.
///
/// It is constructed once by the process entry point, wrapped in an `Arc`, and
/// passed to every HTTP handler and connection task. There is no ambient,
/// global instance.
#[derive(Debug)]
pub struct HubState {
    /// The resolved configuration. Immutable for the lifetime of the hub.
    pub config: Config,
    /// The live connection table.
    pub registry: ConnectionRegistry,
    /// Bounds the number of concurrently served connections to `max_clients`.
    pub connection_permits: Arc<Semaphore>,
    /// Hub-wide counters.
    pub stats: StatsState,
}

impl HubState {
    pub fn new(config: Config) -> Arc<Self> {
        let registry = ConnectionRegistry::from_config(&config.hub);
        let connection_permits = Arc::new(Semaphore::new(config.max_clients));
        Arc::new(Self {
            config,
            registry,
            connection_permits,
            stats: StatsState::new(),
        })
    }

    /// Removes every registered connection. Each dispatcher observes its queue
    /// closing, sends a close frame and tears its connection down.
    pub fn close_all(&self) -> usize {
        let records = self.registry.list();
        records
            .iter()
            .filter(|record| self.registry.remove_record(record))
            .count()
    }

    /// Builds the context commands execute in.
    pub fn execution_context(&self) -> ExecutionContext<'_> {
        ExecutionContext::new(&self.registry).with_echo_broadcast(self.config.hub.echo_broadcast)
    }
}
