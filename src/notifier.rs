// Single entry point for domain services publishing repository events

use crate::Result;
use dvcs_config::{RealtimeSettings, Settings, WebhookSettings};
use dvcs_realtime::{ChannelHub, OutboundKind, RealtimeServer, RealtimeServerConfig};
use dvcs_webhooks::{
    DeliveryOutcome, EventRouter, EventType, RetryPolicy, WebhookConfig, WebhookStore,
};
use std::sync::Arc;
use std::time::Duration;

/// Publishes repository events to webhooks and live channels.
#[derive(Debug, Clone)]
pub struct Notifier {
    router: EventRouter,
    hub: Arc<ChannelHub>,
}

impl Notifier {
    pub fn new(router: EventRouter, hub: Arc<ChannelHub>) -> Self {
        Self { router, hub }
    }

    /// Build an HTTP-backed notifier from settings
    pub fn from_settings(settings: &Settings, store: Arc<dyn WebhookStore>) -> Result<Self> {
        let router = EventRouter::with_http(webhook_config(&settings.webhooks), store)?;
        Ok(Self::new(router, Arc::new(ChannelHub::new())))
    }

    pub fn router(&self) -> &EventRouter {
        &self.router
    }

    pub fn hub(&self) -> &Arc<ChannelHub> {
        &self.hub
    }

    /// Push the live notification for `event`, if it has one, then deliver
    /// the event to every subscribed webhook.
    ///
    /// Resolves once every delivery episode has settled.
    pub async fn publish(
        &self,
        repository_id: &str,
        event: EventType,
        data: serde_json::Value,
    ) -> Result<Vec<DeliveryOutcome>> {
        if let Some(kind) = live_kind(event) {
            let sent = self
                .hub
                .notify_repository_update(repository_id, kind, data.clone());
            tracing::debug!(repository_id, event = %event, sent, "Pushed live notification");
        }

        Ok(self.router.dispatch(repository_id, event, data).await?)
    }

    /// Bind the WebSocket server sharing this notifier's hub
    pub async fn bind_realtime(&self, settings: &RealtimeSettings) -> Result<RealtimeServer> {
        let config = realtime_config(settings)?;
        Ok(RealtimeServer::bind(config, Arc::clone(&self.hub)).await?)
    }
}

/// Live frame type pushed for an event, if any
pub fn live_kind(event: EventType) -> Option<OutboundKind> {
    match event {
        EventType::Comment => Some(OutboundKind::NewComment),
        EventType::PullRequest => Some(OutboundKind::PrUpdated),
        EventType::Issue => Some(OutboundKind::IssueUpdated),
        EventType::Push | EventType::Release | EventType::Branch => None,
    }
}

/// Webhook delivery configuration for the given settings
pub fn webhook_config(settings: &WebhookSettings) -> WebhookConfig {
    let retry_policy = RetryPolicy {
        max_retries: settings.max_retries,
        initial_delay: Duration::from_secs(settings.initial_backoff_secs),
        max_delay: Duration::from_secs(settings.max_backoff_secs),
        ..RetryPolicy::default()
    };

    let mut builder = WebhookConfig::builder()
        .timeout_secs(settings.timeout_secs)
        .retry_policy(retry_policy)
        .max_payload_size(settings.max_payload_size);
    if let Some(user_agent) = &settings.user_agent {
        builder = builder.user_agent(user_agent.clone());
    }
    builder.build()
}

/// WebSocket server configuration for the given settings
pub fn realtime_config(settings: &RealtimeSettings) -> Result<RealtimeServerConfig> {
    Ok(RealtimeServerConfig::default()
        .bind(&settings.bind_addr)?
        .max_message_size(settings.max_message_size))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_live_kind() {
        assert_eq!(live_kind(EventType::Comment), Some(OutboundKind::NewComment));
        assert_eq!(live_kind(EventType::PullRequest), Some(OutboundKind::PrUpdated));
        assert_eq!(live_kind(EventType::Issue), Some(OutboundKind::IssueUpdated));
        assert_eq!(live_kind(EventType::Push), None);
    }

    #[test]
    fn test_webhook_config_from_settings() {
        let settings = WebhookSettings {
            timeout_secs: 5,
            max_retries: 1,
            initial_backoff_secs: 3,
            max_backoff_secs: 9,
            user_agent: Some("hooks/1".to_string()),
            ..WebhookSettings::default()
        };

        let config = webhook_config(&settings);
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.retry_policy.max_retries, 1);
        assert_eq!(config.retry_policy.delay_for_retry(1), Duration::from_secs(3));
        assert_eq!(config.user_agent, "hooks/1");

        let defaults = webhook_config(&WebhookSettings::default());
        assert!(defaults.user_agent.starts_with("DVCS-Webhooks/"));
        assert_eq!(defaults.retry_policy.delay_for_retry(3), Duration::from_secs(8));
    }

    #[test]
    fn test_realtime_config_from_settings() {
        let settings = RealtimeSettings {
            bind_addr: "127.0.0.1:9400".to_string(),
            max_message_size: 1024,
        };
        let config = realtime_config(&settings).unwrap();
        assert_eq!(config.bind_addr.port(), 9400);
        assert_eq!(config.max_message_size, 1024);

        let bad = RealtimeSettings {
            bind_addr: "nowhere".to_string(),
            ..RealtimeSettings::default()
        };
        assert!(realtime_config(&bad).is_err());
    }
}
