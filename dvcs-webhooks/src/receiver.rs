//! Verification of signed deliveries on the receiving side

use crate::signature::headers;
use crate::{EventPayload, Result, WebhookError, WebhookSignature};
use std::collections::HashMap;

/// Receiver for signed webhook deliveries
#[derive(Debug, Clone)]
pub struct WebhookReceiver {
    signature: WebhookSignature,
}

impl WebhookReceiver {
    /// Create a new receiver with the given secret
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            signature: WebhookSignature::new(secret),
        }
    }

    /// Verify a body against a hex signature
    pub fn verify(&self, payload: &[u8], signature: &str) -> bool {
        self.signature.verify(payload, signature)
    }

    /// Verify and parse a delivery
    pub fn receive(&self, payload: &[u8], signature: &str) -> Result<EventPayload> {
        if !self.verify(payload, signature) {
            return Err(WebhookError::SignatureInvalid(
                "Signature verification failed".to_string(),
            ));
        }

        serde_json::from_slice(payload).map_err(|e| WebhookError::PayloadError(e.to_string()))
    }

    /// Verify and parse a delivery, reading the signature from the
    /// `X-DVCS-Signature` header (matched case-insensitively)
    pub fn receive_from_headers(
        &self,
        payload: &[u8],
        request_headers: &HashMap<String, String>,
    ) -> Result<EventPayload> {
        let signature = request_headers
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(headers::SIGNATURE))
            .map(|(_, value)| value.as_str())
            .ok_or(WebhookError::SignatureMissing)?;

        self.receive(payload, signature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EventType, RepositoryRef};
    use serde_json::json;

    fn signed_body(secret: &str) -> (Vec<u8>, String) {
        let payload = EventPayload::new(
            EventType::Issue,
            RepositoryRef::new("repo-1", "widgets", "alice"),
            json!({"number": 7, "action": "opened"}),
        );
        let body = payload.canonical_bytes().unwrap();
        let signature = WebhookSignature::new(secret).sign_canonical(&body);
        (body, signature)
    }

    #[test]
    fn test_receive_valid() {
        let (body, signature) = signed_body("secret");
        let receiver = WebhookReceiver::new("secret");

        let payload = receiver.receive(&body, &signature).unwrap();
        assert_eq!(payload.event, EventType::Issue);
        assert_eq!(payload.data["number"], 7);
    }

    #[test]
    fn test_receive_tampered() {
        let (mut body, signature) = signed_body("secret");
        let receiver = WebhookReceiver::new("secret");

        let last = body.len() - 2;
        body[last] = b'X';

        assert!(matches!(
            receiver.receive(&body, &signature),
            Err(WebhookError::SignatureInvalid(_))
        ));
    }

    #[test]
    fn test_receive_from_headers() {
        let (body, signature) = signed_body("secret");
        let receiver = WebhookReceiver::new("secret");

        let mut request_headers = HashMap::new();
        request_headers.insert("x-dvcs-signature".to_string(), signature);
        assert!(receiver.receive_from_headers(&body, &request_headers).is_ok());

        let empty = HashMap::new();
        assert!(matches!(
            receiver.receive_from_headers(&body, &empty),
            Err(WebhookError::SignatureMissing)
        ));
    }
}
