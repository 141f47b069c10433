//! Live connection lifecycle.

use crate::error::{RealtimeError, RealtimeResult};
use futures_util::stream::SplitSink;
use futures_util::SinkExt;
use parking_lot::RwLock;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::WebSocketStream;
use tungstenite::Message;

/// Unique identifier for a connection.
pub type ConnectionId = String;

/// Connection state.
///
/// States only move forward: `Connecting -> Open -> Closing -> Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ConnectionState {
    /// Handshake in progress
    Connecting,
    /// Connection is open and receives broadcasts
    Open,
    /// Close frame sent, waiting for the writer to drain
    Closing,
    /// Connection is closed
    Closed,
}

/// What the hub needs from a live connection.
pub trait ConnectionHandle: Send + Sync + 'static {
    /// Connection identifier, unique within the process
    fn id(&self) -> &str;

    /// Current lifecycle state
    fn state(&self) -> ConnectionState;

    /// Queue a message; fails when the connection is not open
    fn send(&self, message: Message) -> RealtimeResult<()>;

    /// Check if the connection is open.
    fn is_open(&self) -> bool {
        self.state() == ConnectionState::Open
    }
}

/// A WebSocket connection backed by an outgoing message queue.
#[derive(Debug, Clone)]
pub struct Connection {
    id: ConnectionId,
    /// Remote address
    pub remote_addr: Option<SocketAddr>,
    state: Arc<RwLock<ConnectionState>>,
    tx: mpsc::UnboundedSender<Message>,
}

impl Connection {
    /// Create a connection in the `Connecting` state.
    pub fn new(
        id: impl Into<ConnectionId>,
        remote_addr: Option<SocketAddr>,
        tx: mpsc::UnboundedSender<Message>,
    ) -> Self {
        Self {
            id: id.into(),
            remote_addr,
            state: Arc::new(RwLock::new(ConnectionState::Connecting)),
            tx,
        }
    }

    /// Create a connection together with the receiving end of its queue.
    pub fn channel(id: impl Into<ConnectionId>) -> (Self, mpsc::UnboundedReceiver<Message>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(id, None, tx), rx)
    }

    /// Mark the handshake as complete.
    pub fn open(&self) {
        self.advance(ConnectionState::Open);
    }

    /// Start closing: queue a close frame and stop accepting sends.
    pub fn close(&self) {
        if self.advance(ConnectionState::Closing) {
            let _ = self.tx.send(Message::Close(None));
        }
    }

    /// Mark the connection as fully closed.
    pub fn mark_closed(&self) {
        self.advance(ConnectionState::Closed);
    }

    /// Send a text message.
    pub fn send_text(&self, text: impl Into<String>) -> RealtimeResult<()> {
        self.send(Message::text(text.into()))
    }

    fn advance(&self, next: ConnectionState) -> bool {
        let mut state = self.state.write();
        if next > *state {
            *state = next;
            true
        } else {
            false
        }
    }
}

impl ConnectionHandle for Connection {
    fn id(&self) -> &str {
        &self.id
    }

    fn state(&self) -> ConnectionState {
        *self.state.read()
    }

    fn send(&self, message: Message) -> RealtimeResult<()> {
        if !self.is_open() {
            return Err(RealtimeError::ConnectionClosed);
        }
        self.tx
            .send(message)
            .map_err(|e| RealtimeError::Send(e.to_string()))
    }
}

/// Drains a connection's queue into the socket.
pub(crate) struct ConnectionWriter {
    sink: SplitSink<WebSocketStream<TcpStream>, Message>,
    rx: mpsc::UnboundedReceiver<Message>,
}

impl ConnectionWriter {
    pub(crate) fn new(
        sink: SplitSink<WebSocketStream<TcpStream>, Message>,
        rx: mpsc::UnboundedReceiver<Message>,
    ) -> Self {
        Self { sink, rx }
    }

    /// Run until a close frame is written or every sender is gone.
    pub(crate) async fn run(mut self) {
        while let Some(message) = self.rx.recv().await {
            let is_close = message.is_close();

            if let Err(e) = self.sink.send(message).await {
                tracing::debug!(error = %e, "Failed to write WebSocket message");
                break;
            }

            if is_close {
                break;
            }
        }

        let _ = self.sink.close().await;
    }
}
