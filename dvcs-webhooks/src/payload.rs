//! Webhook payload types

use crate::EventType;
use crate::signature::canonical_bytes;
use serde::{Deserialize, Serialize};

/// Repository summary embedded in every payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryRef {
    /// Repository ID
    pub id: String,

    /// Repository name
    pub name: String,

    /// Owner identity (login or email)
    pub owner: String,
}

impl RepositoryRef {
    /// Create a new repository reference
    pub fn new(id: impl Into<String>, name: impl Into<String>, owner: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            owner: owner.into(),
        }
    }
}

/// The body posted to a webhook endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventPayload {
    /// Event type
    pub event: EventType,

    /// Repository the event happened in
    pub repository: RepositoryRef,

    /// Event specific data
    pub data: serde_json::Value,
}

impl EventPayload {
    /// Create a new payload
    pub fn new(event: EventType, repository: RepositoryRef, data: serde_json::Value) -> Self {
        Self {
            event,
            repository,
            data,
        }
    }

    /// Canonical byte encoding, used both as the request body and as the
    /// signed input.
    pub fn canonical_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        let value = serde_json::to_value(self)?;
        canonical_bytes(&value)
    }

    /// Canonical encoding as a string
    pub fn to_canonical_json(&self) -> Result<String, serde_json::Error> {
        let bytes = self.canonical_bytes()?;
        // serde_json only ever emits UTF-8
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload() -> EventPayload {
        EventPayload::new(
            EventType::Push,
            RepositoryRef::new("repo-1", "widgets", "alice@example.com"),
            json!({"ref": "refs/heads/main", "commits": 2}),
        )
    }

    #[test]
    fn test_canonical_json_is_sorted() {
        let json = payload().to_canonical_json().unwrap();
        assert_eq!(
            json,
            r#"{"data":{"commits":2,"ref":"refs/heads/main"},"event":"push","repository":{"id":"repo-1","name":"widgets","owner":"alice@example.com"}}"#
        );
    }

    #[test]
    fn test_round_trip() {
        let bytes = payload().canonical_bytes().unwrap();
        let parsed: EventPayload = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(parsed, payload());
    }
}
