// src/core/mod.rs

//! The central module containing the core logic and data structures of RelayHub.

pub mod commands;
pub mod errors;
pub mod metrics;
pub mod protocol;
pub mod registry;
pub mod state;

pub use commands::Command;
pub use errors::HubError;
pub use registry::{ConnectionRecord, ConnectionRegistry};
