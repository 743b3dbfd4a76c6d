// src/connection/mod.rs

//! Manages the lifecycle of a single hub connection: registration, the inbound
//! reader and outbound dispatcher loops, and their shared teardown.

mod dispatcher;
mod guard;
mod handler;
mod reader;

// Publicly re-export the primary types from the sub-modules.
pub use dispatcher::OutboundDispatcher;
pub use guard::{ConnectionGuard, TeardownReason};
pub use handler::ConnectionHandler;
pub use reader::InboundReader;
