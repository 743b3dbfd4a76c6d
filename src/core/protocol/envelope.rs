// src/core/protocol/envelope.rs

//! Serialized payloads delivered to connections' outbound queues.

use crate::core::HubError;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// A connection as reported by `whoall` and the participants endpoint.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    pub address: String,
    pub name: String,
}

/// An outbound envelope. The `action` tag mirrors the request that produced it.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum Envelope<'a> {
    Broadcast {
        message: &'a str,
        from: &'a str,
    },
    WhoAll {
        users: Vec<Participant>,
        from: &'a str,
    },
}

impl Envelope<'_> {
    /// Serializes the envelope once so it can be shared by every recipient.
    pub fn to_bytes(&self) -> Result<Bytes, HubError> {
        Ok(Bytes::from(serde_json::to_vec(self)?))
    }
}
