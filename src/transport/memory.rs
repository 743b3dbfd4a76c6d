// src/transport/memory.rs

//! An in-process transport backed by channels.
//!
//! `memory_pair` returns the two halves the hub drives plus a `MemoryPeer`
//! that plays the remote client: it injects inbound frames and observes every
//! frame the hub writes. Used by the test suite and benchmarks.

use super::{FrameSink, FrameSource};
use crate::core::HubError;
use crate::core::protocol::{ControlFrame, InboundFrame};
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::mpsc;

/// A frame observed by the peer on the hub's write half.
#[derive(Debug, Clone, PartialEq)]
pub enum Written {
    Data(Bytes),
    Control(ControlFrame),
    /// The hub closed its write half.
    Closed,
}

/// Flags shared between the hub's halves and the peer.
#[derive(Debug, Default)]
struct Shared {
    stall_writes: AtomicBool,
    close_calls: AtomicUsize,
}

pub struct MemorySource {
    inbound_rx: mpsc::UnboundedReceiver<InboundFrame>,
}

pub struct MemorySink {
    outbound_tx: mpsc::UnboundedSender<Written>,
    shared: Arc<Shared>,
}

/// The remote end of an in-memory connection.
pub struct MemoryPeer {
    inbound_tx: Option<mpsc::UnboundedSender<InboundFrame>>,
    outbound_rx: mpsc::UnboundedReceiver<Written>,
    shared: Arc<Shared>,
}

/// Creates a connected source/sink pair and the peer that drives it.
pub fn memory_pair() -> (MemorySource, MemorySink, MemoryPeer) {
    let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
    let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
    let shared = Arc::new(Shared::default());
    (
        MemorySource { inbound_rx },
        MemorySink {
            outbound_tx,
            shared: shared.clone(),
        },
        MemoryPeer {
            inbound_tx: Some(inbound_tx),
            outbound_rx,
            shared,
        },
    )
}

#[async_trait]
impl FrameSource for MemorySource {
    async fn read_frame(&mut self) -> Result<InboundFrame, HubError> {
        self.inbound_rx
            .recv()
            .await
            .ok_or_else(|| HubError::Transport("peer disconnected".to_string()))
    }
}

impl MemorySink {
    async fn push(&mut self, written: Written) -> Result<(), HubError> {
        if self.shared.stall_writes.load(Ordering::Acquire) {
            // Never completes; only a write deadline gets the caller out.
            std::future::pending::<()>().await;
        }
        self.outbound_tx
            .send(written)
            .map_err(|_| HubError::Transport("peer stopped reading".to_string()))
    }
}

#[async_trait]
impl FrameSink for MemorySink {
    async fn write_frame(&mut self, payload: Bytes) -> Result<(), HubError> {
        self.push(Written::Data(payload)).await
    }

    async fn write_control(&mut self, frame: ControlFrame) -> Result<(), HubError> {
        self.push(Written::Control(frame)).await
    }

    async fn close(&mut self) -> Result<(), HubError> {
        self.shared.close_calls.fetch_add(1, Ordering::AcqRel);
        // The peer may already be gone; closing is still considered done.
        let _ = self.outbound_tx.send(Written::Closed);
        Ok(())
    }
}

impl MemoryPeer {
    /// Sends a text payload to the hub.
    pub fn send_text(&self, text: &str) -> bool {
        self.send(InboundFrame::Data(Bytes::copy_from_slice(text.as_bytes())))
    }

    /// Sends an arbitrary frame to the hub. Returns false if the hub's reader is gone.
    pub fn send(&self, frame: InboundFrame) -> bool {
        self.inbound_tx
            .as_ref()
            .is_some_and(|tx| tx.send(frame).is_ok())
    }

    /// Answers a probe.
    pub fn send_pong(&self) -> bool {
        self.send(InboundFrame::Pong(Bytes::new()))
    }

    /// Drops the inbound channel, which the hub's reader sees as a transport error.
    pub fn hang_up(&mut self) {
        self.inbound_tx.take();
    }

    /// Makes every subsequent write by the hub block forever.
    pub fn stall_writes(&self) {
        self.shared.stall_writes.store(true, Ordering::Release);
    }

    /// How many times the hub closed its write half.
    pub fn close_calls(&self) -> usize {
        self.shared.close_calls.load(Ordering::Acquire)
    }

    /// Waits for the next frame written by the hub. `None` once the sink is dropped.
    pub async fn recv(&mut self) -> Option<Written> {
        self.outbound_rx.recv().await
    }

    /// Returns a frame that has already been written, without waiting.
    pub fn try_recv(&mut self) -> Option<Written> {
        self.outbound_rx.try_recv().ok()
    }

    /// Waits for the next data frame, skipping probes. `None` if the
    /// connection closes first.
    pub async fn recv_data(&mut self) -> Option<Bytes> {
        loop {
            match self.outbound_rx.recv().await? {
                Written::Data(data) => return Some(data),
                Written::Control(ControlFrame::Ping) => continue,
                Written::Control(ControlFrame::Close) | Written::Closed => return None,
            }
        }
    }
}
