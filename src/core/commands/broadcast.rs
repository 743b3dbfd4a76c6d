// src/core/commands/broadcast.rs

use crate::core::HubError;
use crate::core::commands::command_trait::{Delivery, ExecutableCommand, ExecutionContext};
use crate::core::protocol::Envelope;
use tracing::debug;

/// Sends `message` to every live connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Broadcast {
    pub message: String,
    pub origin: String,
}

impl ExecutableCommand for Broadcast {
    fn execute(&self, ctx: &ExecutionContext<'_>) -> Result<Delivery, HubError> {
        let payload = Envelope::Broadcast {
            message: &self.message,
            from: &self.origin,
        }
        .to_bytes()?;

        let recipients = ctx.registry.list();
        debug!(
            "Broadcasting from {} to {} live connections",
            self.origin,
            recipients.len()
        );

        let mut delivery = Delivery::noop();
        for recipient in recipients {
            if !ctx.echo_broadcast && recipient.address() == self.origin {
                continue;
            }
            // `Bytes` clones share the serialized buffer.
            delivery.record(recipient.enqueue(payload.clone()));
        }
        Ok(delivery)
    }
}
