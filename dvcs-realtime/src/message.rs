//! JSON frames exchanged over a repository channel.

use crate::error::RealtimeResult;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Frame types a client may send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InboundKind {
    /// A collaborator edited a file
    FileChange,
    /// A comment was posted
    CommentAdded,
    /// A pull request changed status
    PrStatusChange,
    /// An issue was updated
    IssueUpdate,
}

impl InboundKind {
    /// Parse a wire name, `None` for unknown types.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "file_change" => Some(Self::FileChange),
            "comment_added" => Some(Self::CommentAdded),
            "pr_status_change" => Some(Self::PrStatusChange),
            "issue_update" => Some(Self::IssueUpdate),
            _ => None,
        }
    }

    /// Outbound type this frame is rebroadcast as.
    pub fn outbound(self) -> OutboundKind {
        match self {
            Self::FileChange => OutboundKind::FileUpdated,
            Self::CommentAdded => OutboundKind::NewComment,
            Self::PrStatusChange => OutboundKind::PrUpdated,
            Self::IssueUpdate => OutboundKind::IssueUpdated,
        }
    }

    /// Whether the sender is left out of the rebroadcast.
    ///
    /// File changes are already applied in the sender's editor.
    pub fn excludes_sender(self) -> bool {
        matches!(self, Self::FileChange)
    }
}

/// Frame types the server pushes to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutboundKind {
    /// A file was changed by another collaborator
    FileUpdated,
    /// A comment was posted
    NewComment,
    /// A pull request was updated
    PrUpdated,
    /// An issue was updated
    IssueUpdated,
}

impl OutboundKind {
    /// Wire name of the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FileUpdated => "file_updated",
            Self::NewComment => "new_comment",
            Self::PrUpdated => "pr_updated",
            Self::IssueUpdated => "issue_updated",
        }
    }
}

impl fmt::Display for OutboundKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A `{type, payload}` frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// Frame type
    #[serde(rename = "type")]
    pub kind: String,
    /// Frame payload, `null` when absent
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl Frame {
    /// Create an outbound frame.
    pub fn outbound(kind: OutboundKind, payload: serde_json::Value) -> Self {
        Self {
            kind: kind.as_str().to_string(),
            payload,
        }
    }

    /// Parse a text frame.
    pub fn parse(text: &str) -> RealtimeResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Serialize to JSON text.
    pub fn to_text(&self) -> RealtimeResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Inbound kind of this frame, if it is one.
    pub fn inbound_kind(&self) -> Option<InboundKind> {
        InboundKind::parse(&self.kind)
    }
}
