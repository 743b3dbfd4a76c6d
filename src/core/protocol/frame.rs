// src/core/protocol/frame.rs

//! Frames exchanged with a transport, independent of the underlying protocol.

use bytes::Bytes;

/// Separator placed between coalesced payloads in one outbound frame.
pub const LINE_DELIMITER: u8 = b'\n';

/// A frame read from a connection.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundFrame {
    /// An application payload to be decoded into a command.
    Data(Bytes),
    /// A liveness probe from the peer.
    Ping(Bytes),
    /// A liveness acknowledgement from the peer.
    Pong(Bytes),
    /// The peer asked to close the connection.
    Close,
}

/// A protocol-level control frame written by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlFrame {
    /// A liveness probe.
    Ping,
    /// The server is closing the connection.
    Close,
}
