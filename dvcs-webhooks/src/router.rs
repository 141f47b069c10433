//! Event fan-out to matching webhooks

use crate::{
    DeliveryError, DeliveryOutcome, DeliveryWorker, EventPayload, EventType, Result,
    WebhookConfig, WebhookStore,
};
use futures::future::join_all;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

/// Resolves the webhooks interested in an event and delivers to each of them
/// concurrently.
///
/// Each matching webhook gets its own spawned episode. Outcomes are collected
/// once every episode has settled; a failing endpoint never affects its
/// siblings, and dropping the `dispatch` future leaves started episodes
/// running to completion.
#[derive(Clone)]
pub struct EventRouter {
    store: Arc<dyn WebhookStore>,
    worker: Arc<DeliveryWorker>,
}

impl EventRouter {
    /// Create a router around an existing worker
    pub fn new(store: Arc<dyn WebhookStore>, worker: DeliveryWorker) -> Self {
        Self {
            store,
            worker: Arc::new(worker),
        }
    }

    /// Create a router delivering over HTTP
    pub fn with_http(config: WebhookConfig, store: Arc<dyn WebhookStore>) -> Result<Self> {
        let worker = DeliveryWorker::with_http(config, Arc::clone(&store))?;
        Ok(Self::new(store, worker))
    }

    /// Get the delivery worker
    pub fn worker(&self) -> &DeliveryWorker {
        &self.worker
    }

    /// Deliver `event` to every active webhook of the repository subscribed
    /// to it.
    ///
    /// Only a failure to look up the webhooks is returned as `Err`; delivery
    /// failures are reported per webhook in the outcomes.
    pub async fn dispatch(
        &self,
        repository_id: &str,
        event: EventType,
        data: serde_json::Value,
    ) -> Result<Vec<DeliveryOutcome>> {
        let registrations = self
            .store
            .find_active_webhooks(repository_id, event)
            .await
            .inspect_err(|e| {
                error!(repository_id, event = %event, error = %e, "Failed to resolve webhooks");
            })?;

        let mut handles: Vec<(String, JoinHandle<DeliveryOutcome>)> = Vec::new();
        for registration in registrations {
            if registration.repository_id() != repository_id || !registration.accepts(event) {
                debug!(
                    webhook_id = %registration.id,
                    event = %event,
                    "Skipping webhook that is inactive or not subscribed"
                );
                continue;
            }

            let payload =
                EventPayload::new(event, registration.repository.clone(), data.clone());
            let worker = Arc::clone(&self.worker);
            let webhook_id = registration.id.clone();

            let handle =
                tokio::spawn(async move { worker.deliver(&registration, &payload).await });
            handles.push((webhook_id, handle));
        }

        if handles.is_empty() {
            debug!(repository_id, event = %event, "No webhooks to notify");
            return Ok(Vec::new());
        }

        let (webhook_ids, handles): (Vec<_>, Vec<_>) = handles.into_iter().unzip();
        let outcomes: Vec<DeliveryOutcome> = join_all(handles)
            .await
            .into_iter()
            .zip(webhook_ids)
            .map(|(joined, webhook_id)| match joined {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!(webhook_id = %webhook_id, error = %e, "Delivery task aborted");
                    DeliveryOutcome::Failed {
                        webhook_id,
                        attempts: 0,
                        error: DeliveryError::Internal(e.to_string()),
                    }
                }
            })
            .collect();

        let delivered = outcomes.iter().filter(|o| o.is_delivered()).count();
        info!(
            repository_id,
            event = %event,
            delivered,
            failed = outcomes.len() - delivered,
            "Webhook dispatch settled"
        );

        Ok(outcomes)
    }

    /// Run [`dispatch`](Self::dispatch) in the background
    pub fn spawn_dispatch(
        &self,
        repository_id: impl Into<String>,
        event: EventType,
        data: serde_json::Value,
    ) -> JoinHandle<Result<Vec<DeliveryOutcome>>> {
        let router = self.clone();
        let repository_id = repository_id.into();
        tokio::spawn(async move { router.dispatch(&repository_id, event, data).await })
    }
}

impl std::fmt::Debug for EventRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventRouter")
            .field("worker", &self.worker)
            .finish_non_exhaustive()
    }
}
