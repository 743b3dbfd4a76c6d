// tests/integration/test_helpers.rs

//! Test helpers and utilities for integration tests

use relayhub::config::Config;
use relayhub::connection::{ConnectionHandler, TeardownReason};
use relayhub::core::registry::ConnectionRecord;
use relayhub::core::state::HubState;
use relayhub::transport::memory::{MemoryPeer, memory_pair};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

/// How long a test waits for a frame before giving up.
#[allow(dead_code)]
pub const RECV_TIMEOUT: Duration = Duration::from_secs(5);

/// TestHub provides a hub with no network listener; clients connect over
/// in-memory transports.
pub struct TestHub {
    pub state: Arc<HubState>,
}

impl TestHub {
    /// Creates a new test hub with default configuration
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Creates a new test hub with custom configuration
    #[allow(dead_code)]
    pub fn with_config(config: Config) -> Self {
        // Initialize tracing (ignore error if already initialized)
        let _ = tracing_subscriber::registry()
            .with(EnvFilter::new("warn"))
            .with(tracing_subscriber::fmt::layer().with_test_writer())
            .try_init();

        Self {
            state: HubState::new(config),
        }
    }

    /// Registers `address` and serves it on a background task.
    pub fn connect(&self, address: &str) -> TestClient {
        let handler = ConnectionHandler::register(self.state.clone(), address)
            .expect("address should be free");
        let record = handler.record().clone();
        let (source, sink, peer) = memory_pair();
        let task = tokio::spawn(handler.run(source, sink));
        TestClient {
            address: address.to_string(),
            record,
            peer,
            task,
            pending: VecDeque::new(),
        }
    }
}

/// One connected client as seen from the far side of its transport.
pub struct TestClient {
    pub address: String,
    pub record: Arc<ConnectionRecord>,
    pub peer: MemoryPeer,
    pub task: JoinHandle<TeardownReason>,
    pending: VecDeque<Value>,
}

#[allow(dead_code)]
impl TestClient {
    /// Sends a JSON request to the hub.
    pub fn send_json(&self, value: Value) {
        assert!(
            self.peer.send_text(&value.to_string()),
            "hub stopped reading from {}",
            self.address
        );
    }

    pub fn broadcast(&self, message: &str) {
        self.send_json(serde_json::json!({"action": "broadcast", "message": message}));
    }

    pub fn whoall(&self) {
        self.send_json(serde_json::json!({"action": "whoall"}));
    }

    pub fn identify(&self, name: &str) {
        self.send_json(serde_json::json!({"action": "identify", "name": name}));
    }

    /// Returns the next envelope delivered to this client. Coalesced frames
    /// are split on newlines and handed out one envelope at a time.
    pub async fn next_envelope(&mut self) -> Value {
        if let Some(value) = self.pending.pop_front() {
            return value;
        }
        let frame = tokio::time::timeout(RECV_TIMEOUT, self.peer.recv_data())
            .await
            .unwrap_or_else(|_| panic!("{} received nothing", self.address))
            .unwrap_or_else(|| panic!("{} was closed", self.address));
        for line in frame.split(|b| *b == b'\n') {
            self.pending
                .push_back(serde_json::from_slice(line).expect("envelope should be JSON"));
        }
        self.pending.pop_front().expect("frame should not be empty")
    }

    /// Waits for the connection task to finish.
    pub async fn finish(&mut self) -> TeardownReason {
        tokio::time::timeout(RECV_TIMEOUT, &mut self.task)
            .await
            .expect("connection task should finish")
            .expect("connection task should not panic")
    }
}
