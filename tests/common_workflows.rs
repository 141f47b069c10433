//! Integration tests for common notification workflows.
//!
//! A domain service publishes an event; subscribed webhooks receive a signed
//! delivery and live clients of the repository receive the matching frame.

use dvcs_events::prelude::*;
use dvcs_events::{realtime_config, webhook_config};
use dvcs_config::RealtimeSettings;
use dvcs_webhooks::signature::headers;
use dvcs_webhooks::{AttemptStatus, WebhookReceiver};
use futures_util::StreamExt;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use wiremock::matchers::{header, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn repository() -> RepositoryRef {
    RepositoryRef::new("repo-1", "widgets", "alice@example.com")
}

async fn notifier_with(store: &InMemoryWebhookStore) -> Notifier {
    let mut settings = Settings::default();
    settings.webhooks.timeout_secs = 2;
    settings.realtime.bind_addr = "127.0.0.1:0".to_string();
    Notifier::from_settings(&settings, Arc::new(store.clone())).unwrap()
}

async fn wait_for(condition: impl Fn() -> bool) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

// =============================================================================
// Publish Tests
// =============================================================================

#[tokio::test]
async fn test_publish_comment_reaches_webhook_and_live_clients() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header("X-DVCS-Event", "comment"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let store = InMemoryWebhookStore::new();
    store.register(
        WebhookRegistration::builder(repository(), server.uri())
            .id("hook-1")
            .secret("hook-secret")
            .events([EventType::Comment])
            .build(),
    );

    let notifier = notifier_with(&store).await;
    let realtime = RealtimeSettings {
        bind_addr: "127.0.0.1:0".to_string(),
        ..RealtimeSettings::default()
    };
    let ws_server = notifier.bind_realtime(&realtime).await.unwrap();
    let addr = ws_server.local_addr().unwrap();
    tokio::spawn(ws_server.run());

    let (mut client, _) = connect_async(format!("ws://{}/?repoId=repo-1", addr))
        .await
        .unwrap();
    let hub = Arc::clone(notifier.hub());
    wait_for(|| hub.channel_size("repo-1") == 1).await;

    let outcomes = notifier
        .publish("repo-1", EventType::Comment, json!({"id": 77, "body": "Ship it"}))
        .await
        .unwrap();

    assert_eq!(outcomes.len(), 1);
    assert!(outcomes[0].is_delivered());

    // Live frame
    let frame = loop {
        let message = tokio::time::timeout(Duration::from_secs(5), client.next())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        if let Message::Text(text) = message {
            break serde_json::from_str::<Value>(text.as_str()).unwrap();
        }
    };
    assert_eq!(
        frame,
        json!({"type": "new_comment", "payload": {"id": 77, "body": "Ship it"}})
    );

    // Webhook delivery verifies with the registration secret
    let requests = server.received_requests().await.unwrap();
    let signature = requests[0]
        .headers
        .get(headers::SIGNATURE)
        .and_then(|v| v.to_str().ok())
        .unwrap();
    let payload = WebhookReceiver::new("hook-secret")
        .receive(&requests[0].body, signature)
        .unwrap();
    assert_eq!(payload.repository, repository());
    assert_eq!(payload.data["id"], 77);

    let rows = store.deliveries_for("hook-1");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].status, AttemptStatus::Success);
}

#[tokio::test]
async fn test_publish_push_without_subscribers() {
    let store = InMemoryWebhookStore::new();
    let notifier = notifier_with(&store).await;

    let outcomes = notifier
        .publish("repo-1", EventType::Push, json!({"ref": "refs/heads/main"}))
        .await
        .unwrap();

    assert!(outcomes.is_empty());
    assert!(store.deliveries().is_empty());
    assert_eq!(notifier.hub().connection_count(), 0);
}

// =============================================================================
// Configuration Tests
// =============================================================================

#[test]
fn test_settings_to_component_configs() {
    let settings = Settings::default();
    settings.validate().unwrap();

    let webhooks = webhook_config(&settings.webhooks);
    assert_eq!(webhooks.timeout, Duration::from_secs(10));
    assert_eq!(webhooks.retry_policy.max_retries, 3);

    let realtime = realtime_config(&settings.realtime).unwrap();
    assert_eq!(realtime.bind_addr.port(), 9001);
}
