// src/core/commands/whoall.rs

use crate::core::HubError;
use crate::core::commands::command_trait::{Delivery, ExecutableCommand, ExecutionContext};
use crate::core::protocol::Envelope;
use tracing::debug;

/// Replies to the sender with the list of every live connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WhoAll {
    pub origin: String,
}

impl ExecutableCommand for WhoAll {
    fn execute(&self, ctx: &ExecutionContext<'_>) -> Result<Delivery, HubError> {
        // The sender may have disconnected between decode and execute.
        let Some(sender) = ctx.registry.find(&self.origin) else {
            debug!("Could not find sender address {}, skipping whoall", self.origin);
            return Ok(Delivery::noop());
        };

        let payload = Envelope::WhoAll {
            users: ctx.registry.participants(),
            from: &self.origin,
        }
        .to_bytes()?;

        let mut delivery = Delivery::noop();
        delivery.record(sender.enqueue(payload));
        Ok(delivery)
    }
}
