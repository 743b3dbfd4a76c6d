// src/transport/websocket.rs

//! WebSocket transport built on `axum`'s upgraded sockets.

use super::{FrameSink, FrameSource};
use crate::core::HubError;
use crate::core::protocol::{ControlFrame, InboundFrame};
use async_trait::async_trait;
use axum::extract::ws::{Message, WebSocket};
use bytes::Bytes;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};

/// The read half of an upgraded WebSocket.
pub struct WsSource {
    inner: SplitStream<WebSocket>,
}

/// The write half of an upgraded WebSocket.
pub struct WsSink {
    inner: SplitSink<WebSocket, Message>,
}

/// Splits an upgraded socket into the halves driven by the reader and dispatcher.
pub fn split(socket: WebSocket) -> (WsSource, WsSink) {
    let (sink, stream) = socket.split();
    (WsSource { inner: stream }, WsSink { inner: sink })
}

#[async_trait]
impl FrameSource for WsSource {
    async fn read_frame(&mut self) -> Result<InboundFrame, HubError> {
        match self.inner.next().await {
            Some(Ok(Message::Text(text))) => Ok(InboundFrame::Data(Bytes::copy_from_slice(
                text.as_str().as_bytes(),
            ))),
            Some(Ok(Message::Binary(data))) => Ok(InboundFrame::Data(data)),
            Some(Ok(Message::Ping(data))) => Ok(InboundFrame::Ping(data)),
            Some(Ok(Message::Pong(data))) => Ok(InboundFrame::Pong(data)),
            Some(Ok(Message::Close(_))) => Ok(InboundFrame::Close),
            Some(Err(e)) => Err(e.into()),
            None => Err(HubError::Transport("websocket stream ended".to_string())),
        }
    }
}

#[async_trait]
impl FrameSink for WsSink {
    async fn write_frame(&mut self, payload: Bytes) -> Result<(), HubError> {
        // Envelopes are JSON, so text frames are the norm.
        let message = match std::str::from_utf8(&payload) {
            Ok(text) => Message::Text(text.into()),
            Err(_) => Message::Binary(payload),
        };
        self.inner.send(message).await?;
        Ok(())
    }

    async fn write_control(&mut self, frame: ControlFrame) -> Result<(), HubError> {
        let message = match frame {
            ControlFrame::Ping => Message::Ping(Bytes::new()),
            ControlFrame::Close => Message::Close(None),
        };
        self.inner.send(message).await?;
        Ok(())
    }

    async fn close(&mut self) -> Result<(), HubError> {
        self.inner.close().await?;
        Ok(())
    }
}
