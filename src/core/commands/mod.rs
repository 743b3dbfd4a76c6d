// src/core/commands/mod.rs

//! This module defines all supported commands and the central `Command` enum
//! that encapsulates their decoded state. The set of commands is closed: adding
//! one means adding a variant here, and the compiler points at every dispatch
//! site that needs to handle it.

use crate::core::HubError;
use crate::core::metrics;
use tracing::warn;

pub mod broadcast;
pub mod command_trait;
pub mod identify;
pub mod whoall;

pub use broadcast::Broadcast;
pub use command_trait::{Delivery, ExecutableCommand, ExecutionContext};
pub use identify::Identify;
pub use whoall::WhoAll;

/// A decoded request, tagged by action. Every variant carries the address of
/// the connection that submitted it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Broadcast(Broadcast),
    WhoAll(WhoAll),
    Identify(Identify),
}

impl Command {
    /// The wire name of the command's action.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Broadcast(_) => "broadcast",
            Command::WhoAll(_) => "whoall",
            Command::Identify(_) => "identify",
        }
    }

    /// The address of the connection that submitted the command.
    pub fn origin(&self) -> &str {
        match self {
            Command::Broadcast(c) => &c.origin,
            Command::WhoAll(c) => &c.origin,
            Command::Identify(c) => &c.origin,
        }
    }

    /// Executes the command and logs any per-recipient failures.
    ///
    /// Partial failures are reported in the returned `Delivery`; they are never
    /// turned into an `Err`.
    pub fn execute(&self, ctx: &ExecutionContext<'_>) -> Result<Delivery, HubError> {
        metrics::COMMANDS_PROCESSED_TOTAL
            .with_label_values(&[self.name()])
            .inc();

        let delivery = match self {
            Command::Broadcast(c) => c.execute(ctx),
            Command::WhoAll(c) => c.execute(ctx),
            Command::Identify(c) => c.execute(ctx),
        }?;

        metrics::ENVELOPES_DELIVERED_TOTAL.inc_by(delivery.delivered as f64);
        for failure in &delivery.failures {
            metrics::ENVELOPES_DROPPED_TOTAL.inc();
            warn!(
                "'{}' from {}: envelope dropped: {}",
                self.name(),
                self.origin(),
                failure
            );
        }
        Ok(delivery)
    }
}
