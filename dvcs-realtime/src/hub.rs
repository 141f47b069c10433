//! Repository channels and broadcasting.

use crate::connection::{ConnectionHandle, ConnectionId};
use crate::error::RealtimeResult;
use crate::message::{Frame, OutboundKind};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tungstenite::Message;

type Channel = HashMap<ConnectionId, Arc<dyn ConnectionHandle>>;

/// Registry of live connections grouped by repository.
///
/// Every read and write of the registry goes through one lock. Broadcasts
/// copy the channel membership under the lock and send outside of it, so a
/// slow or closing connection never blocks connect/disconnect.
#[derive(Default)]
pub struct ChannelHub {
    channels: Mutex<HashMap<String, Channel>>,
}

impl ChannelHub {
    /// Create an empty hub.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a connection to a repository channel, creating the channel if needed.
    pub fn connect(&self, repository_id: &str, connection: Arc<dyn ConnectionHandle>) {
        let connection_id = connection.id().to_string();
        self.channels
            .lock()
            .entry(repository_id.to_string())
            .or_default()
            .insert(connection_id.clone(), connection);

        tracing::debug!(repository_id, connection_id = %connection_id, "Joined channel");
    }

    /// Remove a connection; an emptied channel is dropped.
    pub fn disconnect(&self, repository_id: &str, connection_id: &str) -> bool {
        let mut channels = self.channels.lock();
        let Some(channel) = channels.get_mut(repository_id) else {
            return false;
        };

        let removed = channel.remove(connection_id).is_some();
        if channel.is_empty() {
            channels.remove(repository_id);
        }
        drop(channels);

        if removed {
            tracing::debug!(repository_id, connection_id, "Left channel");
        }
        removed
    }

    /// Send a frame to every open member of a channel except `exclude`.
    ///
    /// Returns the number of connections the frame was queued on. An unknown
    /// channel is a no-op.
    pub fn broadcast(&self, repository_id: &str, exclude: Option<&str>, frame: &Frame) -> usize {
        let members: Vec<Arc<dyn ConnectionHandle>> = match self.channels.lock().get(repository_id)
        {
            Some(channel) => channel.values().cloned().collect(),
            None => return 0,
        };

        let text = match frame.to_text() {
            Ok(text) => text,
            Err(e) => {
                tracing::error!(repository_id, error = %e, "Failed to encode frame");
                return 0;
            }
        };

        let mut sent = 0;
        for member in members {
            if exclude == Some(member.id()) || !member.is_open() {
                continue;
            }

            // A member may close between the snapshot and the send
            match member.send(Message::text(text.clone())) {
                Ok(()) => sent += 1,
                Err(e) => {
                    tracing::debug!(
                        repository_id,
                        connection_id = member.id(),
                        error = %e,
                        "Dropped frame for closing connection"
                    );
                }
            }
        }

        tracing::trace!(repository_id, kind = %frame.kind, sent, "Broadcast frame");
        sent
    }

    /// Handle a text frame received from `sender_id`.
    ///
    /// Known frame types are rebroadcast under their outbound name; unknown
    /// types are ignored. Malformed JSON is an error for the caller to log.
    pub fn handle_inbound(
        &self,
        repository_id: &str,
        sender_id: &str,
        text: &str,
    ) -> RealtimeResult<usize> {
        let frame = Frame::parse(text)?;

        let Some(kind) = frame.inbound_kind() else {
            tracing::debug!(
                repository_id,
                connection_id = sender_id,
                kind = %frame.kind,
                "Ignoring unknown frame type"
            );
            return Ok(0);
        };

        let exclude = kind.excludes_sender().then_some(sender_id);
        let outbound = Frame::outbound(kind.outbound(), frame.payload);
        Ok(self.broadcast(repository_id, exclude, &outbound))
    }

    /// Push a server-originated notification to every member of a channel.
    pub fn notify_repository_update(
        &self,
        repository_id: &str,
        kind: OutboundKind,
        payload: serde_json::Value,
    ) -> usize {
        self.broadcast(repository_id, None, &Frame::outbound(kind, payload))
    }

    /// Repositories with at least one connection.
    pub fn active_channels(&self) -> Vec<String> {
        self.channels.lock().keys().cloned().collect()
    }

    /// Number of connections in a channel.
    pub fn channel_size(&self, repository_id: &str) -> usize {
        self.channels
            .lock()
            .get(repository_id)
            .map_or(0, HashMap::len)
    }

    /// Check if a repository has a channel.
    pub fn has_channel(&self, repository_id: &str) -> bool {
        self.channels.lock().contains_key(repository_id)
    }

    /// Total number of connections across channels.
    pub fn connection_count(&self) -> usize {
        self.channels.lock().values().map(HashMap::len).sum()
    }
}

impl fmt::Debug for ChannelHub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let channels = self.channels.lock();
        f.debug_struct("ChannelHub")
            .field("channels", &channels.len())
            .field(
                "connections",
                &channels.values().map(HashMap::len).sum::<usize>(),
            )
            .finish()
    }
}
