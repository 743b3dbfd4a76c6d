// src/core/protocol/decode.rs

//! Decodes raw inbound payloads into typed commands.

use crate::core::HubError;
use crate::core::commands::{Broadcast, Command, Identify, WhoAll};
use serde::Deserialize;

/// The JSON shape of an inbound request, discriminated by its `action` field.
///
/// Any `from` field sent by the client is ignored; the origin of a command is
/// always the address of the connection it arrived on.
#[derive(Deserialize, Debug)]
#[serde(tag = "action", rename_all = "lowercase")]
enum Request {
    Broadcast { message: String },
    WhoAll {},
    Identify { name: String },
}

/// Decodes `payload`, received from `sender`, into a `Command`.
///
/// Payloads that are not JSON objects, lack an `action`, name an unknown
/// action or are missing required fields all yield `HubError::Decode`.
pub fn decode(sender: &str, payload: &[u8]) -> Result<Command, HubError> {
    let request: Request =
        serde_json::from_slice(payload).map_err(|e| HubError::Decode(e.to_string()))?;

    let origin = sender.to_string();
    let command = match request {
        Request::Broadcast { message } => Command::Broadcast(Broadcast { message, origin }),
        Request::WhoAll {} => Command::WhoAll(WhoAll { origin }),
        Request::Identify { name } => {
            let name = name.trim();
            if name.is_empty() {
                return Err(HubError::Decode("identify requires a non-empty name".into()));
            }
            Command::Identify(Identify {
                name: name.to_string(),
                origin,
            })
        }
    };
    Ok(command)
}
