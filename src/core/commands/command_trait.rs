// src/core/commands/command_trait.rs

//! Defines the core traits and result types shared by all executable commands.

use crate::core::HubError;
use crate::core::registry::ConnectionRegistry;

/// Everything a command needs to run: registry access plus hub-wide options.
/// Commands never take a connection's lock; they only go through the registry.
#[derive(Debug, Clone, Copy)]
pub struct ExecutionContext<'a> {
    pub registry: &'a ConnectionRegistry,
    /// If true, a broadcast is also delivered back to its sender.
    pub echo_broadcast: bool,
}

impl<'a> ExecutionContext<'a> {
    pub fn new(registry: &'a ConnectionRegistry) -> Self {
        Self {
            registry,
            echo_broadcast: false,
        }
    }

    pub fn with_echo_broadcast(mut self, echo: bool) -> Self {
        self.echo_broadcast = echo;
        self
    }
}

/// The aggregated result of one command's fan-out.
///
/// Per-recipient failures are collected here rather than returned as an
/// error, so one unreachable recipient never hides delivery to the others.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Delivery {
    /// Number of envelopes that were enqueued.
    pub delivered: usize,
    /// One entry per recipient whose enqueue failed.
    pub failures: Vec<HubError>,
}

impl Delivery {
    /// A command that had nothing to deliver.
    pub fn noop() -> Self {
        Self::default()
    }

    /// Folds one recipient's enqueue result into the report.
    pub fn record(&mut self, result: Result<(), HubError>) {
        match result {
            Ok(()) => self.delivered += 1,
            Err(e) => self.failures.push(e),
        }
    }

    /// True if no recipient failed.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Total number of recipients the command attempted to reach.
    pub fn attempted(&self) -> usize {
        self.delivered + self.failures.len()
    }
}

/// A trait for commands that can be executed against the registry.
pub trait ExecutableCommand {
    /// Performs the command's side effects. A hard error is returned only when
    /// the command could not run at all (e.g. its envelope failed to serialize).
    fn execute(&self, ctx: &ExecutionContext<'_>) -> Result<Delivery, HubError>;
}
