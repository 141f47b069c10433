//! WebSocket server feeding the channel hub.

use crate::connection::{Connection, ConnectionHandle, ConnectionWriter};
use crate::error::{RealtimeError, RealtimeResult};
use crate::hub::ChannelHub;
use futures_util::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::accept_hdr_async_with_config;
use tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tungstenite::protocol::WebSocketConfig;
use tungstenite::Message;

/// Query parameter naming the repository channel.
pub const REPOSITORY_QUERY_PARAM: &str = "repoId";

/// Real-time server configuration.
#[derive(Debug, Clone)]
pub struct RealtimeServerConfig {
    /// Address to bind to
    pub bind_addr: SocketAddr,
    /// Maximum inbound message size in bytes
    pub max_message_size: usize,
}

impl Default for RealtimeServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 9001)),
            max_message_size: 64 * 1024, // 64KB
        }
    }
}

impl RealtimeServerConfig {
    /// Set the bind address from a string.
    pub fn bind(mut self, addr: &str) -> RealtimeResult<Self> {
        self.bind_addr = addr
            .parse()
            .map_err(|e| RealtimeError::Server(format!("Invalid address: {}", e)))?;
        Ok(self)
    }

    /// Set the maximum message size.
    pub fn max_message_size(mut self, size: usize) -> Self {
        self.max_message_size = size;
        self
    }

    fn websocket_config(&self) -> WebSocketConfig {
        let mut config = WebSocketConfig::default();
        config.max_message_size = Some(self.max_message_size);
        config.max_frame_size = Some(self.max_message_size);
        config
    }
}

/// Accepts WebSocket connections and attaches them to repository channels.
#[derive(Debug)]
pub struct RealtimeServer {
    listener: TcpListener,
    config: RealtimeServerConfig,
    hub: Arc<ChannelHub>,
}

impl RealtimeServer {
    /// Bind the listener.
    pub async fn bind(config: RealtimeServerConfig, hub: Arc<ChannelHub>) -> RealtimeResult<Self> {
        let listener = TcpListener::bind(config.bind_addr).await?;
        Ok(Self {
            listener,
            config,
            hub,
        })
    }

    /// Address the listener is bound to.
    pub fn local_addr(&self) -> RealtimeResult<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Get the channel hub.
    pub fn hub(&self) -> &Arc<ChannelHub> {
        &self.hub
    }

    /// Accept connections until the task is dropped.
    pub async fn run(self) -> RealtimeResult<()> {
        tracing::info!(addr = %self.local_addr()?, "Realtime server listening");

        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => {
                    let hub = Arc::clone(&self.hub);
                    let ws_config = self.config.websocket_config();

                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, addr, hub, ws_config).await {
                            tracing::warn!(addr = %addr, error = %e, "Connection error");
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to accept connection");
                }
            }
        }
    }
}

/// Read the repository ID from a request query string.
fn repository_from_query(query: Option<&str>) -> Option<String> {
    url::form_urlencoded::parse(query?.as_bytes())
        .find(|(key, _)| key == REPOSITORY_QUERY_PARAM)
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
}

async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    hub: Arc<ChannelHub>,
    ws_config: WebSocketConfig,
) -> RealtimeResult<()> {
    let mut repository_id = None;
    let callback = |request: &Request, response: Response| -> Result<Response, ErrorResponse> {
        repository_id = repository_from_query(request.uri().query());
        Ok(response)
    };
    let mut ws_stream = accept_hdr_async_with_config(stream, callback, Some(ws_config)).await?;

    let Some(repository_id) = repository_id else {
        tracing::debug!(addr = %addr, "Closing connection without repository");
        let _ = ws_stream.close(None).await;
        return Err(RealtimeError::MissingRepository);
    };

    let (write, mut read) = ws_stream.split();
    let (tx, rx) = mpsc::unbounded_channel();
    let connection = Arc::new(Connection::new(
        uuid::Uuid::new_v4().to_string(),
        Some(addr),
        tx,
    ));
    let connection_id = connection.id().to_string();

    let writer = ConnectionWriter::new(write, rx);
    let writer_handle = tokio::spawn(writer.run());

    connection.open();
    hub.connect(&repository_id, connection.clone());

    tracing::debug!(
        connection_id = %connection_id,
        repository_id = %repository_id,
        addr = %addr,
        "WebSocket connection established"
    );

    while let Some(result) = read.next().await {
        match result {
            Ok(Message::Text(text)) => {
                if let Err(e) = hub.handle_inbound(&repository_id, &connection_id, text.as_str()) {
                    tracing::warn!(connection_id = %connection_id, error = %e, "Ignoring inbound frame");
                }
            }
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(connection_id = %connection_id, error = %e, "WebSocket read error");
                break;
            }
        }
    }

    connection.close();
    let _ = writer_handle.await;
    connection.mark_closed();
    hub.disconnect(&repository_id, &connection_id);

    tracing::debug!(connection_id = %connection_id, "WebSocket connection closed");

    Ok(())
}
