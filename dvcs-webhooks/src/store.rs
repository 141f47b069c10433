//! Delivery log records and the webhook store contract
//!
//! Persistence is owned by the host application. Delivery only needs the
//! three operations on [`WebhookStore`]; [`InMemoryWebhookStore`] backs tests
//! and single-process deployments.

use crate::{EventType, Result, WebhookError, WebhookRegistration, WebhookStatus};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// Status of a single delivery attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptStatus {
    /// Attempt not yet completed
    Pending,
    /// Endpoint answered 2xx
    Success,
    /// Attempt failed
    Failed,
}

/// One row of the delivery log: exactly one per HTTP attempt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryAttempt {
    /// Row ID
    pub id: String,

    /// Webhook the attempt was made for
    pub webhook_id: String,

    /// Event type
    pub event: EventType,

    /// Canonical JSON body that was sent
    pub payload: String,

    /// Attempt status
    pub status: AttemptStatus,

    /// HTTP status code, when the endpoint answered
    pub response_code: Option<u16>,

    /// Failure description
    pub error_message: Option<String>,

    /// 0 for the initial attempt, k for the k-th retry
    pub retry_count: u32,

    /// Row creation time
    pub created_at: DateTime<Utc>,
}

impl DeliveryAttempt {
    /// Record a successful attempt
    pub fn success(
        webhook_id: impl Into<String>,
        event: EventType,
        payload: impl Into<String>,
        response_code: u16,
        retry_count: u32,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            webhook_id: webhook_id.into(),
            event,
            payload: payload.into(),
            status: AttemptStatus::Success,
            response_code: Some(response_code),
            error_message: None,
            retry_count,
            created_at: Utc::now(),
        }
    }

    /// Record a failed attempt
    pub fn failure(
        webhook_id: impl Into<String>,
        event: EventType,
        payload: impl Into<String>,
        error: &crate::DeliveryError,
        retry_count: u32,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            webhook_id: webhook_id.into(),
            event,
            payload: payload.into(),
            status: AttemptStatus::Failed,
            response_code: error.status_code(),
            error_message: Some(error.log_message()),
            retry_count,
            created_at: Utc::now(),
        }
    }
}

/// Storage operations consumed by the delivery path
#[async_trait]
pub trait WebhookStore: Send + Sync + 'static {
    /// Active registrations of `repository_id` subscribed to `event`
    async fn find_active_webhooks(
        &self,
        repository_id: &str,
        event: EventType,
    ) -> Result<Vec<WebhookRegistration>>;

    /// Append one delivery attempt to the log
    async fn append_delivery_log(&self, attempt: DeliveryAttempt) -> Result<()>;

    /// Write back the result of a completed episode
    async fn update_webhook_status(
        &self,
        webhook_id: &str,
        last_delivery_at: DateTime<Utc>,
        last_status: WebhookStatus,
    ) -> Result<()>;
}

/// In-memory webhook store
#[derive(Debug, Clone, Default)]
pub struct InMemoryWebhookStore {
    webhooks: Arc<RwLock<HashMap<String, WebhookRegistration>>>,
    deliveries: Arc<RwLock<Vec<DeliveryAttempt>>>,
}

impl InMemoryWebhookStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a webhook, replacing any with the same ID
    pub fn register(&self, registration: WebhookRegistration) -> String {
        let id = registration.id.clone();
        self.webhooks.write().insert(id.clone(), registration);
        id
    }

    /// Remove a webhook by ID
    pub fn unregister(&self, id: &str) -> Option<WebhookRegistration> {
        self.webhooks.write().remove(id)
    }

    /// Get a webhook by ID
    pub fn get(&self, id: &str) -> Option<WebhookRegistration> {
        self.webhooks.read().get(id).cloned()
    }

    /// All webhooks of a repository, active or not
    pub fn list_for_repository(&self, repository_id: &str) -> Vec<WebhookRegistration> {
        self.webhooks
            .read()
            .values()
            .filter(|w| w.repository_id() == repository_id)
            .cloned()
            .collect()
    }

    /// Delivery log rows of a webhook, in append order
    pub fn deliveries_for(&self, webhook_id: &str) -> Vec<DeliveryAttempt> {
        self.deliveries
            .read()
            .iter()
            .filter(|d| d.webhook_id == webhook_id)
            .cloned()
            .collect()
    }

    /// Every delivery log row, in append order
    pub fn deliveries(&self) -> Vec<DeliveryAttempt> {
        self.deliveries.read().clone()
    }

    /// Get the number of registered webhooks
    pub fn count(&self) -> usize {
        self.webhooks.read().len()
    }
}

#[async_trait]
impl WebhookStore for InMemoryWebhookStore {
    async fn find_active_webhooks(
        &self,
        repository_id: &str,
        event: EventType,
    ) -> Result<Vec<WebhookRegistration>> {
        Ok(self
            .webhooks
            .read()
            .values()
            .filter(|w| w.repository_id() == repository_id && w.accepts(event))
            .cloned()
            .collect())
    }

    async fn append_delivery_log(&self, attempt: DeliveryAttempt) -> Result<()> {
        self.deliveries.write().push(attempt);
        Ok(())
    }

    async fn update_webhook_status(
        &self,
        webhook_id: &str,
        last_delivery_at: DateTime<Utc>,
        last_status: WebhookStatus,
    ) -> Result<()> {
        let mut webhooks = self.webhooks.write();
        match webhooks.get_mut(webhook_id) {
            Some(webhook) => {
                webhook.record_status(last_delivery_at, last_status);
                Ok(())
            }
            None => Err(WebhookError::WebhookNotFound(webhook_id.to_string())),
        }
    }
}
