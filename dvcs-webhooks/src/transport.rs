//! HTTP transport for outbound deliveries

use crate::signature::headers;
use crate::{AttemptResult, DeliveryError, EventType, Result, WebhookConfig, WebhookError};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use std::time::Duration;

/// Maximum number of response body bytes kept for the delivery log
const MAX_RESPONSE_EXCERPT: usize = 1024;

/// A single signed POST to a webhook endpoint
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    /// Target URL
    pub url: String,

    /// Event type, sent as `X-DVCS-Event`
    pub event: EventType,

    /// Hex signature over `body`, sent as `X-DVCS-Signature`
    pub signature: String,

    /// Fresh per attempt, sent as `X-DVCS-Delivery`
    pub delivery_id: String,

    /// Canonical JSON body
    pub body: Bytes,
}

/// Performs one delivery attempt and classifies its result.
///
/// Implementations must never panic on endpoint misbehaviour; every outcome
/// is expressed as an [`AttemptResult`].
#[async_trait]
pub trait DeliveryTransport: Send + Sync + 'static {
    /// POST the request, giving up after `timeout`
    async fn post(&self, request: &OutboundRequest, timeout: Duration) -> AttemptResult;
}

/// reqwest-backed transport
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http_client: Client,
}

impl HttpTransport {
    /// Create a transport from the webhook configuration
    pub fn new(config: &WebhookConfig) -> Result<Self> {
        let http_client = Client::builder()
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| WebhookError::ConfigError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { http_client })
    }

    /// Wrap an existing client
    pub fn with_client(http_client: Client) -> Self {
        Self { http_client }
    }

    fn classify_error(error: reqwest::Error, timeout: Duration) -> AttemptResult {
        let error = if error.is_timeout() {
            DeliveryError::Timeout(timeout.as_millis() as u64)
        } else if error.is_builder() {
            DeliveryError::InvalidRequest(error.to_string())
        } else {
            DeliveryError::Network(error.to_string())
        };
        AttemptResult::from_error(error)
    }
}

#[async_trait]
impl DeliveryTransport for HttpTransport {
    async fn post(&self, request: &OutboundRequest, timeout: Duration) -> AttemptResult {
        let url = match url::Url::parse(&request.url) {
            Ok(url) => url,
            Err(e) => {
                return AttemptResult::from_error(DeliveryError::InvalidRequest(format!(
                    "invalid URL {}: {}",
                    request.url, e
                )));
            }
        };

        let response = self
            .http_client
            .post(url)
            .timeout(timeout)
            .header("Content-Type", "application/json")
            .header(headers::EVENT, request.event.as_str())
            .header(headers::SIGNATURE, &request.signature)
            .header(headers::DELIVERY, &request.delivery_id)
            .body(request.body.clone())
            .send()
            .await;

        match response {
            Ok(response) => {
                let status = response.status();
                if status.is_success() {
                    return AttemptResult::Success {
                        status_code: status.as_u16(),
                    };
                }

                let body = read_excerpt(response).await;
                AttemptResult::from_error(DeliveryError::Status {
                    status: status.as_u16(),
                    body,
                })
            }
            Err(e) => Self::classify_error(e, timeout),
        }
    }
}

/// Read at most a little over `MAX_RESPONSE_EXCERPT` bytes of the body and
/// truncate them for the delivery log
async fn read_excerpt(mut response: reqwest::Response) -> Option<String> {
    let mut buf: Vec<u8> = Vec::new();
    while buf.len() <= MAX_RESPONSE_EXCERPT {
        match response.chunk().await {
            Ok(Some(chunk)) => buf.extend_from_slice(&chunk),
            Ok(None) => break,
            Err(_) if buf.is_empty() => return None,
            Err(_) => break,
        }
    }

    // Keep one spare char so truncation still marks the cut
    buf.truncate(MAX_RESPONSE_EXCERPT + 4);
    let text = String::from_utf8_lossy(&buf);
    Some(truncate_string(&text, MAX_RESPONSE_EXCERPT))
}

/// Truncate a string to a maximum byte length on a char boundary
fn truncate_string(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        return s.to_string();
    }

    let mut end = max_len.saturating_sub(3);
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &s[..end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_truncate_string() {
        assert_eq!(truncate_string("short", 10), "short");

        let long = "a".repeat(20);
        let truncated = truncate_string(&long, 10);
        assert_eq!(truncated, "aaaaaaa...");

        // multi-byte characters are never split
        let accents = "é".repeat(10);
        let truncated = truncate_string(&accents, 8);
        assert!(truncated.ends_with("..."));
        assert!(truncated.len() <= 8);
    }

    #[tokio::test]
    async fn test_large_error_body_is_cut_to_excerpt() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(502).set_body_string("x".repeat(4 * 1024 * 1024)),
            )
            .mount(&server)
            .await;

        let transport = HttpTransport::new(&WebhookConfig::default()).unwrap();
        let request = OutboundRequest {
            url: server.uri(),
            event: EventType::Push,
            signature: "00".to_string(),
            delivery_id: "d-1".to_string(),
            body: Bytes::from_static(b"{}"),
        };

        match transport.post(&request, Duration::from_secs(5)).await {
            AttemptResult::RetryableFailure(DeliveryError::Status { status, body }) => {
                assert_eq!(status, 502);
                let body = body.unwrap();
                assert!(body.len() <= MAX_RESPONSE_EXCERPT);
                assert!(body.ends_with("..."));
            }
            other => panic!("expected status failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_invalid_url_is_terminal() {
        let transport = HttpTransport::new(&WebhookConfig::default()).unwrap();
        let request = OutboundRequest {
            url: "not a url".to_string(),
            event: EventType::Push,
            signature: "00".to_string(),
            delivery_id: "d-1".to_string(),
            body: Bytes::from_static(b"{}"),
        };

        let result = transport.post(&request, Duration::from_secs(1)).await;
        assert!(matches!(
            result,
            AttemptResult::TerminalFailure(DeliveryError::InvalidRequest(_))
        ));
    }
}
