//! # DVCS Realtime
//!
//! Live repository notifications over WebSocket using tokio-tungstenite.
//!
//! ## Features
//!
//! - One channel per repository, joined with the `repoId` query parameter
//! - Connection lifecycle tracking (`connecting -> open -> closing -> closed`)
//! - Collaborative edit relay with echo suppression
//! - Server-pushed comment, pull request and issue notifications
//! - Ping/pong support
//!
//! ## Example
//!
//! ```rust,no_run
//! use dvcs_realtime::{ChannelHub, OutboundKind, RealtimeServer, RealtimeServerConfig};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let hub = Arc::new(ChannelHub::new());
//!     let server = RealtimeServer::bind(RealtimeServerConfig::default(), hub.clone()).await?;
//!     tokio::spawn(server.run());
//!
//!     // Later, from domain logic
//!     hub.notify_repository_update(
//!         "repo-1",
//!         OutboundKind::NewComment,
//!         serde_json::json!({"id": 42, "body": "Looks good"}),
//!     );
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod connection;
mod error;
mod hub;
mod message;
mod server;

pub use connection::{Connection, ConnectionHandle, ConnectionId, ConnectionState};
pub use error::{RealtimeError, RealtimeResult};
pub use hub::ChannelHub;
pub use message::{Frame, InboundKind, OutboundKind};
pub use server::{RealtimeServer, RealtimeServerConfig, REPOSITORY_QUERY_PARAM};

// Re-export the raw message type carried by connections
pub use tungstenite::Message as RawMessage;
