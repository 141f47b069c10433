//! Error types for webhook operations

use thiserror::Error;

/// Errors that can occur during webhook operations
#[derive(Error, Debug)]
pub enum WebhookError {
    /// Invalid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Signature verification failed
    #[error("Signature verification failed: {0}")]
    SignatureInvalid(String),

    /// Signature missing from request
    #[error("Signature missing from request")]
    SignatureMissing,

    /// Payload serialization/deserialization failed
    #[error("Payload error: {0}")]
    PayloadError(String),

    /// Registration failed validation
    #[error("Invalid registration: {0}")]
    InvalidRegistration(String),

    /// Webhook not found in the store
    #[error("Webhook not found: {0}")]
    WebhookNotFound(String),

    /// The backing store rejected an operation
    #[error("Store error: {0}")]
    Store(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<serde_json::Error> for WebhookError {
    fn from(err: serde_json::Error) -> Self {
        WebhookError::PayloadError(err.to_string())
    }
}

/// Why a single delivery attempt did not succeed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeliveryError {
    /// The endpoint answered with a non-2xx status
    #[error("Endpoint responded with HTTP {status}")]
    Status {
        /// Response status code
        status: u16,
        /// Truncated response body, if any
        body: Option<String>,
    },

    /// The attempt exceeded its timeout, in milliseconds
    #[error("Request timed out after {0}ms")]
    Timeout(u64),

    /// Connection or transport failure
    #[error("Network error: {0}")]
    Network(String),

    /// The request could not be built (bad URL, oversized body)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The delivery task itself failed
    #[error("Delivery task failed: {0}")]
    Internal(String),
}

impl DeliveryError {
    /// HTTP status code carried by the error, if the endpoint answered
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether another attempt could plausibly succeed
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::InvalidRequest(_) | Self::Internal(_))
    }

    /// Message recorded in the delivery log
    pub fn log_message(&self) -> String {
        match self {
            Self::Status {
                status,
                body: Some(body),
            } if !body.is_empty() => format!("HTTP {}: {}", status, body),
            _ => self.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_code() {
        let err = DeliveryError::Status {
            status: 503,
            body: None,
        };
        assert_eq!(err.status_code(), Some(503));
        assert_eq!(DeliveryError::Timeout(10_000).status_code(), None);
    }

    #[test]
    fn test_retryable() {
        assert!(DeliveryError::Timeout(10_000).is_retryable());
        assert!(DeliveryError::Network("refused".into()).is_retryable());
        assert!(
            DeliveryError::Status {
                status: 404,
                body: None
            }
            .is_retryable()
        );
        assert!(!DeliveryError::InvalidRequest("bad url".into()).is_retryable());
    }

    #[test]
    fn test_log_message_includes_body() {
        let err = DeliveryError::Status {
            status: 500,
            body: Some("boom".into()),
        };
        assert_eq!(err.log_message(), "HTTP 500: boom");

        let err = DeliveryError::Status {
            status: 500,
            body: Some(String::new()),
        };
        assert_eq!(err.log_message(), "Endpoint responded with HTTP 500");
    }
}
