// src/core/errors.rs

//! Defines the primary error type for the entire hub.

use std::sync::Arc;
use thiserror::Error;

/// The main error enum, representing all possible failures within the hub.
///
/// Only `Startup` is allowed to abort the process. `Transport` and `Io` are
/// fatal to a single connection, while `Decode` and `RecipientUnavailable`
/// are logged and otherwise ignored.
#[derive(Error, Debug)]
pub enum HubError {
    /// A connection with the same address is already registered.
    #[error("Duplicate address '{0}': a connection with this address is already registered")]
    DuplicateAddress(String),

    /// An inbound payload was malformed or named an unknown action.
    #[error("Decode error: {0}")]
    Decode(String),

    /// An envelope could not be enqueued for one recipient of a command.
    #[error("Recipient '{address}' unavailable: {reason}")]
    RecipientUnavailable { address: String, reason: String },

    /// A read, write or deadline failure on a single connection's transport.
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("IO Error: {0}")]
    Io(Arc<std::io::Error>),

    /// A failure before the hub started serving.
    #[error("Startup error: {0}")]
    Startup(String),

    #[error("Internal Server Error: {0}")]
    Internal(String),
}

impl HubError {
    /// Returns true if the error terminates the connection it occurred on.
    pub fn is_fatal_to_connection(&self) -> bool {
        matches!(self, HubError::Transport(_) | HubError::Io(_))
    }
}

// Manual implementation of Clone because `std::io::Error` is not cloneable.
impl Clone for HubError {
    fn clone(&self) -> Self {
        match self {
            HubError::DuplicateAddress(s) => HubError::DuplicateAddress(s.clone()),
            HubError::Decode(s) => HubError::Decode(s.clone()),
            HubError::RecipientUnavailable { address, reason } => HubError::RecipientUnavailable {
                address: address.clone(),
                reason: reason.clone(),
            },
            HubError::Transport(s) => HubError::Transport(s.clone()),
            HubError::Io(e) => HubError::Io(Arc::clone(e)),
            HubError::Startup(s) => HubError::Startup(s.clone()),
            HubError::Internal(s) => HubError::Internal(s.clone()),
        }
    }
}

impl PartialEq for HubError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (HubError::DuplicateAddress(a), HubError::DuplicateAddress(b)) => a == b,
            (HubError::Decode(a), HubError::Decode(b)) => a == b,
            (
                HubError::RecipientUnavailable {
                    address: a1,
                    reason: r1,
                },
                HubError::RecipientUnavailable {
                    address: a2,
                    reason: r2,
                },
            ) => a1 == a2 && r1 == r2,
            (HubError::Transport(a), HubError::Transport(b)) => a == b,
            (HubError::Io(e1), HubError::Io(e2)) => e1.to_string() == e2.to_string(),
            (HubError::Startup(a), HubError::Startup(b)) => a == b,
            (HubError::Internal(a), HubError::Internal(b)) => a == b,
            _ => false,
        }
    }
}

// --- From trait implementations for easy error conversion ---

impl From<std::io::Error> for HubError {
    fn from(e: std::io::Error) -> Self {
        HubError::Io(Arc::new(e))
    }
}

impl From<serde_json::Error> for HubError {
    fn from(e: serde_json::Error) -> Self {
        HubError::Internal(format!("JSON serialization error: {e}"))
    }
}

impl From<axum::Error> for HubError {
    fn from(e: axum::Error) -> Self {
        HubError::Transport(e.to_string())
    }
}

impl From<tokio::time::error::Elapsed> for HubError {
    fn from(_: tokio::time::error::Elapsed) -> Self {
        HubError::Transport("deadline exceeded".to_string())
    }
}
