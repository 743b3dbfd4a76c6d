// src/core/protocol/mod.rs

//! Wire-level types: transport frames, the JSON request decoder and the
//! outbound envelopes.

pub mod decode;
pub mod envelope;
pub mod frame;

pub use decode::decode;
pub use envelope::{Envelope, Participant};
pub use frame::{ControlFrame, InboundFrame, LINE_DELIMITER};
