//! Delivery episodes: one event, one webhook, initial attempt plus retries

use crate::{
    AttemptResult, DeliveryAttempt, DeliveryError, DeliveryTransport, EventPayload, HttpTransport,
    OutboundRequest, Result, RetryPolicy, WebhookConfig, WebhookRegistration, WebhookSignature,
    WebhookStatus, WebhookStore,
};
use bytes::Bytes;
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Settled result of one delivery episode
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// The endpoint accepted the event
    Delivered {
        /// Webhook ID
        webhook_id: String,
        /// Attempts made, including the successful one
        attempts: u32,
        /// Status code of the successful response
        status_code: u16,
    },

    /// The episode ended without a successful attempt
    Failed {
        /// Webhook ID
        webhook_id: String,
        /// Attempts made
        attempts: u32,
        /// Failure of the last attempt
        error: DeliveryError,
    },
}

impl DeliveryOutcome {
    /// Webhook the outcome belongs to
    pub fn webhook_id(&self) -> &str {
        match self {
            Self::Delivered { webhook_id, .. } | Self::Failed { webhook_id, .. } => webhook_id,
        }
    }

    /// Number of attempts made
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Delivered { attempts, .. } | Self::Failed { attempts, .. } => *attempts,
        }
    }

    /// Check if the episode delivered
    pub fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered { .. })
    }
}

/// Progress of an episode
#[derive(Debug, Default)]
struct EpisodeState {
    /// Retry index of the next attempt; 0 is the initial attempt
    attempt: u32,
    last_error: Option<DeliveryError>,
}

/// Runs delivery episodes against a transport, recording every attempt
#[derive(Clone)]
pub struct DeliveryWorker {
    config: WebhookConfig,
    store: Arc<dyn WebhookStore>,
    transport: Arc<dyn DeliveryTransport>,
}

impl DeliveryWorker {
    /// Create a worker with an explicit transport
    pub fn new(
        config: WebhookConfig,
        store: Arc<dyn WebhookStore>,
        transport: Arc<dyn DeliveryTransport>,
    ) -> Self {
        Self {
            config,
            store,
            transport,
        }
    }

    /// Create a worker delivering over HTTP
    pub fn with_http(config: WebhookConfig, store: Arc<dyn WebhookStore>) -> Result<Self> {
        let transport = HttpTransport::new(&config)?;
        Ok(Self::new(config, store, Arc::new(transport)))
    }

    /// Get the configuration
    pub fn config(&self) -> &WebhookConfig {
        &self.config
    }

    /// Deliver using the configured retry policy
    pub async fn deliver(
        &self,
        registration: &WebhookRegistration,
        payload: &EventPayload,
    ) -> DeliveryOutcome {
        let policy = self.config.retry_policy.clone();
        self.deliver_with_policy(registration, payload, &policy)
            .await
    }

    /// Deliver with an explicit retry policy.
    ///
    /// Every attempt appends one log row before the retry decision. The
    /// signature is computed once; the delivery ID is fresh per attempt.
    pub async fn deliver_with_policy(
        &self,
        registration: &WebhookRegistration,
        payload: &EventPayload,
        policy: &RetryPolicy,
    ) -> DeliveryOutcome {
        let body = match self.encode(payload) {
            Ok(body) => body,
            Err(e) => return self.exhaust(registration, payload, "", 1, e).await,
        };
        let body_text = String::from_utf8_lossy(&body).into_owned();
        let signature = WebhookSignature::new(&registration.secret).sign_canonical(&body);

        let mut state = EpisodeState::default();

        loop {
            let request = OutboundRequest {
                url: registration.url.clone(),
                event: payload.event,
                signature: signature.clone(),
                delivery_id: Uuid::new_v4().to_string(),
                body: body.clone(),
            };

            debug!(
                webhook_id = %registration.id,
                delivery_id = %request.delivery_id,
                attempt = state.attempt + 1,
                "Webhook delivery attempt"
            );

            let result = self.transport.post(&request, self.config.timeout).await;
            self.record_attempt(registration, payload, &body_text, &result, state.attempt)
                .await;

            match result {
                AttemptResult::Success { status_code } => {
                    if let Some(previous) = &state.last_error {
                        debug!(
                            webhook_id = %registration.id,
                            previous_error = %previous,
                            "Webhook delivery recovered after retry"
                        );
                    }
                    info!(
                        webhook_id = %registration.id,
                        url = %registration.url,
                        attempt = state.attempt + 1,
                        status_code,
                        "Webhook delivered"
                    );
                    self.update_status(registration, WebhookStatus::Success)
                        .await;
                    return DeliveryOutcome::Delivered {
                        webhook_id: registration.id.clone(),
                        attempts: state.attempt + 1,
                        status_code,
                    };
                }
                AttemptResult::RetryableFailure(err) => {
                    state.attempt += 1;
                    if !policy.should_retry(state.attempt) {
                        return self
                            .exhaust_recorded(registration, state.attempt, err)
                            .await;
                    }

                    let delay = policy.delay_for_retry(state.attempt);
                    warn!(
                        webhook_id = %registration.id,
                        error = %err,
                        retry = state.attempt,
                        delay_ms = delay.as_millis() as u64,
                        "Webhook delivery failed, retrying"
                    );
                    state.last_error = Some(err);
                    tokio::time::sleep(delay).await;
                }
                AttemptResult::TerminalFailure(err) => {
                    return self
                        .exhaust_recorded(registration, state.attempt + 1, err)
                        .await;
                }
            }
        }
    }

    /// Canonical body, rejected when too large to send
    fn encode(&self, payload: &EventPayload) -> std::result::Result<Bytes, DeliveryError> {
        let body = payload
            .canonical_bytes()
            .map_err(|e| DeliveryError::InvalidRequest(format!("payload encoding: {}", e)))?;

        if body.len() > self.config.max_payload_size {
            return Err(DeliveryError::InvalidRequest(format!(
                "Payload too large: {} bytes (max: {})",
                body.len(),
                self.config.max_payload_size
            )));
        }

        Ok(Bytes::from(body))
    }

    async fn record_attempt(
        &self,
        registration: &WebhookRegistration,
        payload: &EventPayload,
        body: &str,
        result: &AttemptResult,
        retry_count: u32,
    ) {
        let row = match result {
            AttemptResult::Success { status_code } => DeliveryAttempt::success(
                &registration.id,
                payload.event,
                body,
                *status_code,
                retry_count,
            ),
            AttemptResult::RetryableFailure(err) | AttemptResult::TerminalFailure(err) => {
                DeliveryAttempt::failure(&registration.id, payload.event, body, err, retry_count)
            }
        };

        if let Err(e) = self.store.append_delivery_log(row).await {
            warn!(webhook_id = %registration.id, error = %e, "Failed to append delivery log");
        }
    }

    async fn update_status(&self, registration: &WebhookRegistration, status: WebhookStatus) {
        if let Err(e) = self
            .store
            .update_webhook_status(&registration.id, Utc::now(), status)
            .await
        {
            warn!(webhook_id = %registration.id, error = %e, "Failed to update webhook status");
        }
    }

    /// Fail an episode whose request could not be built; the single attempt
    /// still gets its log row.
    async fn exhaust(
        &self,
        registration: &WebhookRegistration,
        payload: &EventPayload,
        body: &str,
        attempts: u32,
        err: DeliveryError,
    ) -> DeliveryOutcome {
        let result = AttemptResult::TerminalFailure(err.clone());
        self.record_attempt(registration, payload, body, &result, 0)
            .await;
        self.exhaust_recorded(registration, attempts, err).await
    }

    async fn exhaust_recorded(
        &self,
        registration: &WebhookRegistration,
        attempts: u32,
        err: DeliveryError,
    ) -> DeliveryOutcome {
        error!(
            webhook_id = %registration.id,
            url = %registration.url,
            attempts,
            error = %err,
            "Webhook delivery failed permanently"
        );
        self.update_status(registration, WebhookStatus::Failed)
            .await;

        DeliveryOutcome::Failed {
            webhook_id: registration.id.clone(),
            attempts,
            error: err,
        }
    }
}

impl std::fmt::Debug for DeliveryWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeliveryWorker")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
