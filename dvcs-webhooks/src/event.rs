//! Repository event taxonomy

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of repository event a webhook can subscribe to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    /// Commits pushed to a branch
    Push,
    /// Pull request opened, updated or merged
    PullRequest,
    /// Issue opened, edited or closed
    Issue,
    /// Comment added on an issue or pull request
    Comment,
    /// Release published
    Release,
    /// Branch created or deleted
    Branch,
}

impl EventType {
    /// Every event type, in declaration order
    pub const ALL: [EventType; 6] = [
        EventType::Push,
        EventType::PullRequest,
        EventType::Issue,
        EventType::Comment,
        EventType::Release,
        EventType::Branch,
    ];

    /// Wire name used in payloads and the `X-DVCS-Event` header
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Push => "push",
            Self::PullRequest => "pull_request",
            Self::Issue => "issue",
            Self::Comment => "comment",
            Self::Release => "release",
            Self::Branch => "branch",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventType {
    type Err = crate::WebhookError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventType::ALL
            .into_iter()
            .find(|event| event.as_str() == s)
            .ok_or_else(|| crate::WebhookError::PayloadError(format!("Unknown event type: {}", s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_names() {
        assert_eq!(EventType::PullRequest.as_str(), "pull_request");
        assert_eq!(EventType::Push.to_string(), "push");
        assert_eq!(
            serde_json::to_string(&EventType::PullRequest).unwrap(),
            "\"pull_request\""
        );
    }

    #[test]
    fn test_from_str() {
        for event in EventType::ALL {
            assert_eq!(event.as_str().parse::<EventType>().unwrap(), event);
        }
        assert!("tag".parse::<EventType>().is_err());
    }
}
