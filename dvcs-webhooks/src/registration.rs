//! Webhook registrations
//!
//! A registration is owned by the repository owner and managed through the
//! configuration API. Delivery only reads it, apart from the status fields
//! written back after each episode.

use crate::{EventType, RepositoryRef, Result, WebhookError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

/// Outcome of the most recently completed delivery episode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WebhookStatus {
    /// Last episode delivered
    Success,
    /// Last episode exhausted its retries
    Failed,
}

/// A webhook registered on a repository
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookRegistration {
    /// Unique webhook ID
    pub id: String,

    /// Repository this webhook belongs to
    pub repository: RepositoryRef,

    /// Target URL for webhook delivery
    pub url: String,

    /// Signing secret, never serialized
    #[serde(skip_serializing, default)]
    pub secret: String,

    /// Events this webhook is subscribed to
    pub events: HashSet<EventType>,

    /// Whether this webhook receives deliveries
    pub active: bool,

    /// Completion time of the last episode
    pub last_delivery_at: Option<DateTime<Utc>>,

    /// Result of the last episode
    pub last_status: Option<WebhookStatus>,

    /// Created timestamp
    pub created_at: DateTime<Utc>,
}

impl WebhookRegistration {
    /// Create a new active registration with a freshly generated secret
    pub fn new(repository: RepositoryRef, url: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            repository,
            url: url.into(),
            secret: generate_secret(),
            events: HashSet::new(),
            active: true,
            last_delivery_at: None,
            last_status: None,
            created_at: Utc::now(),
        }
    }

    /// Create a builder for custom configuration
    pub fn builder(repository: RepositoryRef, url: impl Into<String>) -> WebhookRegistrationBuilder {
        WebhookRegistrationBuilder::new(repository, url)
    }

    /// ID of the owning repository
    pub fn repository_id(&self) -> &str {
        &self.repository.id
    }

    /// Add a single event subscription
    pub fn subscribe(&mut self, event: EventType) {
        self.events.insert(event);
    }

    /// Remove an event subscription
    pub fn unsubscribe(&mut self, event: EventType) {
        self.events.remove(&event);
    }

    /// Check if this webhook is subscribed to an event
    pub fn is_subscribed_to(&self, event: EventType) -> bool {
        self.events.contains(&event)
    }

    /// Whether a delivery for `event` should be attempted
    pub fn accepts(&self, event: EventType) -> bool {
        self.active && self.is_subscribed_to(event)
    }

    /// Record the result of a completed episode
    pub fn record_status(&mut self, at: DateTime<Utc>, status: WebhookStatus) {
        self.last_delivery_at = Some(at);
        self.last_status = Some(status);
    }

    /// Regenerate the signing secret
    pub fn rotate_secret(&mut self) -> String {
        self.secret = generate_secret();
        self.secret.clone()
    }

    /// Check the registration before it is stored.
    ///
    /// The URL must be absolute http(s) and at least one event must be
    /// subscribed.
    pub fn validate(&self) -> Result<()> {
        let url = url::Url::parse(&self.url)?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(WebhookError::InvalidRegistration(format!(
                "unsupported URL scheme: {}",
                url.scheme()
            )));
        }
        if self.events.is_empty() {
            return Err(WebhookError::InvalidRegistration(
                "at least one event is required".to_string(),
            ));
        }
        if self.secret.is_empty() {
            return Err(WebhookError::InvalidRegistration(
                "signing secret is empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for WebhookRegistration
#[derive(Debug, Clone)]
pub struct WebhookRegistrationBuilder {
    registration: WebhookRegistration,
}

impl WebhookRegistrationBuilder {
    /// Create a new builder
    pub fn new(repository: RepositoryRef, url: impl Into<String>) -> Self {
        Self {
            registration: WebhookRegistration::new(repository, url),
        }
    }

    /// Set a custom ID
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.registration.id = id.into();
        self
    }

    /// Set the signing secret
    pub fn secret(mut self, secret: impl Into<String>) -> Self {
        self.registration.secret = secret.into();
        self
    }

    /// Subscribe to events
    pub fn events(mut self, events: impl IntoIterator<Item = EventType>) -> Self {
        self.registration.events = events.into_iter().collect();
        self
    }

    /// Subscribe to every event type
    pub fn all_events(self) -> Self {
        self.events(EventType::ALL)
    }

    /// Set active status
    pub fn active(mut self, active: bool) -> Self {
        self.registration.active = active;
        self
    }

    /// Build the registration without validation
    pub fn build(self) -> WebhookRegistration {
        self.registration
    }

    /// Build and validate the registration
    pub fn try_build(self) -> Result<WebhookRegistration> {
        self.registration.validate()?;
        Ok(self.registration)
    }
}

/// Generate a random signing secret: 32 random bytes, hex encoded
pub fn generate_secret() -> String {
    let bytes: [u8; 32] = rand::random();
    hex::encode(bytes)
}
