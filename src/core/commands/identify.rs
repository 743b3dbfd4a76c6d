// src/core/commands/identify.rs

use crate::core::HubError;
use crate::core::commands::command_trait::{Delivery, ExecutableCommand, ExecutionContext};
use tracing::debug;

/// Sets the display name reported for the sender in `whoall` listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identify {
    pub name: String,
    pub origin: String,
}

impl ExecutableCommand for Identify {
    fn execute(&self, ctx: &ExecutionContext<'_>) -> Result<Delivery, HubError> {
        if let Some(record) = ctx.registry.find(&self.origin) {
            record.set_display_name(self.name.clone());
            debug!("Connection {} identified as '{}'", self.origin, self.name);
        }
        Ok(Delivery::noop())
    }
}
