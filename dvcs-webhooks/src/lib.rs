//! Webhook delivery for DVCS repository events
//!
//! This crate notifies external HTTP endpoints when something happens in a
//! repository (a push, a pull request update, a new comment...).
//!
//! # Features
//!
//! - **Signed Deliveries**: HMAC-SHA256 over a canonical JSON body
//! - **Automatic Retries**: Exponential backoff with a bounded retry budget
//! - **Event Routing**: Concurrent fan-out to every subscribed webhook
//! - **Delivery Log**: One record per attempt through a pluggable store
//! - **Receiving Side**: Constant-time verification for consumers
//!
//! # Example: Dispatching an Event
//!
//! ```rust,no_run
//! use dvcs_webhooks::{
//!     EventRouter, EventType, InMemoryWebhookStore, RepositoryRef, WebhookConfig,
//!     WebhookRegistration,
//! };
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = InMemoryWebhookStore::new();
//!     store.register(
//!         WebhookRegistration::builder(
//!             RepositoryRef::new("repo-1", "widgets", "alice"),
//!             "https://ci.example.com/hooks",
//!         )
//!         .events([EventType::Push])
//!         .build(),
//!     );
//!
//!     let router = EventRouter::with_http(WebhookConfig::default(), Arc::new(store))?;
//!     let outcomes = router
//!         .dispatch("repo-1", EventType::Push, serde_json::json!({"ref": "refs/heads/main"}))
//!         .await?;
//!
//!     for outcome in outcomes {
//!         println!("{} delivered: {}", outcome.webhook_id(), outcome.is_delivered());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Example: Verifying a Delivery
//!
//! ```rust,no_run
//! use dvcs_webhooks::WebhookReceiver;
//!
//! let receiver = WebhookReceiver::new("your-secret-key");
//!
//! let body = br#"{"data":{},"event":"push","repository":{"id":"1","name":"w","owner":"a"}}"#;
//! let signature_header = "3f7a...";
//!
//! let is_valid = receiver.verify(body, signature_header);
//! ```

mod config;
mod error;
mod event;
mod payload;
mod receiver;
mod registration;
mod retry;
mod router;
pub mod signature;
mod store;
mod transport;
mod worker;

pub use config::{WebhookConfig, WebhookConfigBuilder};
pub use error::{DeliveryError, WebhookError};
pub use event::EventType;
pub use payload::{EventPayload, RepositoryRef};
pub use receiver::WebhookReceiver;
pub use registration::{
    generate_secret, WebhookRegistration, WebhookRegistrationBuilder, WebhookStatus,
};
pub use retry::{AttemptResult, RetryPolicy};
pub use router::EventRouter;
pub use signature::WebhookSignature;
pub use store::{AttemptStatus, DeliveryAttempt, InMemoryWebhookStore, WebhookStore};
pub use transport::{DeliveryTransport, HttpTransport, OutboundRequest};
pub use worker::{DeliveryOutcome, DeliveryWorker};

/// Result type for webhook operations
pub type Result<T> = std::result::Result<T, WebhookError>;
