// src/transport/mod.rs

//! The transport boundary of the hub.
//!
//! A connection's transport is split into a read half (`FrameSource`), owned
//! by its inbound reader, and a write half (`FrameSink`), owned by its
//! outbound dispatcher. Deadlines are not set on the transport itself; the
//! loops wrap each call in a `tokio::time` timeout instead.

pub mod memory;
pub mod websocket;

use crate::core::HubError;
use crate::core::protocol::{ControlFrame, InboundFrame};
use async_trait::async_trait;
use bytes::Bytes;

/// The read half of a connection.
#[async_trait]
pub trait FrameSource: Send {
    /// Waits for the next frame. End of stream is reported as a `Transport` error.
    async fn read_frame(&mut self) -> Result<InboundFrame, HubError>;
}

/// The write half of a connection.
#[async_trait]
pub trait FrameSink: Send {
    /// Writes one application payload as a single frame.
    async fn write_frame(&mut self, payload: Bytes) -> Result<(), HubError>;

    /// Writes a protocol-level control frame.
    async fn write_control(&mut self, frame: ControlFrame) -> Result<(), HubError>;

    /// Closes the underlying transport.
    async fn close(&mut self) -> Result<(), HubError>;
}

pub type BoxedSource = Box<dyn FrameSource>;
pub type BoxedSink = Box<dyn FrameSink>;
