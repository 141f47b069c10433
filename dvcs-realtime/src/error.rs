//! Error types for real-time notifications.

use thiserror::Error;

/// Real-time channel error type.
#[derive(Error, Debug)]
pub enum RealtimeError {
    /// Protocol error
    #[error("Protocol error: {0}")]
    Protocol(#[from] tungstenite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Inbound frame is not valid JSON or lacks a type
    #[error("Invalid frame: {0}")]
    InvalidFrame(#[from] serde_json::Error),

    /// The handshake carried no `repoId` query parameter
    #[error("Missing repoId query parameter")]
    MissingRepository,

    /// Connection is not open
    #[error("Connection closed")]
    ConnectionClosed,

    /// Send error
    #[error("Failed to send message: {0}")]
    Send(String),

    /// Server error
    #[error("Server error: {0}")]
    Server(String),
}

/// Result type for real-time operations.
pub type RealtimeResult<T> = Result<T, RealtimeError>;
