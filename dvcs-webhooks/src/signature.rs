//! Webhook signature generation and verification
//!
//! Signatures are HMAC-SHA256 over the canonical JSON encoding of the payload:
//! object keys sorted by byte order at every depth, no insignificant
//! whitespace, arrays in their original order. Verification runs over the
//! received bytes exactly as sent, and only accepts bodies that are already
//! in canonical form.

use crate::Result;
use hmac::{Hmac, Mac};
use serde::Serialize;
use serde_json::{Map, Value};
use sha2::Sha256;
use std::fmt;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Rebuild a JSON value with every object's keys in ascending order.
pub fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.as_bytes().cmp(b.0.as_bytes()));

            let mut sorted = Map::new();
            for (key, value) in entries {
                sorted.insert(key.clone(), canonicalize(value));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}

/// Canonical byte encoding of a JSON value
pub fn canonical_bytes(value: &Value) -> std::result::Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec(&canonicalize(value))
}

/// Webhook signature utilities
#[derive(Clone)]
pub struct WebhookSignature {
    secret: String,
}

impl fmt::Debug for WebhookSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebhookSignature")
            .field("secret", &"<redacted>")
            .finish()
    }
}

impl WebhookSignature {
    /// Create a new signature utility with the given secret
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Sign any serializable payload
    pub fn sign<T: Serialize>(&self, payload: &T) -> Result<String> {
        let value = serde_json::to_value(payload)?;
        let canonical = canonical_bytes(&value)?;
        Ok(self.sign_canonical(&canonical))
    }

    /// Sign bytes that are already in canonical form
    pub fn sign_canonical(&self, canonical: &[u8]) -> String {
        hex::encode(self.compute_hmac_sha256(canonical))
    }

    /// Verify a hex signature against a received JSON body.
    ///
    /// Returns `false` for a body that is not canonical JSON (including one
    /// with repeated keys or extra whitespace), for a signature that is not
    /// the exact lowercase hex recomputation, and for any length mismatch.
    pub fn verify(&self, payload: &[u8], signature: &str) -> bool {
        let Ok(value) = serde_json::from_slice::<Value>(payload) else {
            return false;
        };
        match canonical_bytes(&value) {
            Ok(canonical) if canonical == payload => {}
            _ => return false,
        }

        let expected = self.sign_canonical(payload);
        // Constant-time comparison to prevent timing attacks
        expected.as_bytes().ct_eq(signature.as_bytes()).into()
    }

    fn compute_hmac_sha256(&self, data: &[u8]) -> Vec<u8> {
        let mut mac =
            HmacSha256::new_from_slice(self.secret.as_bytes()).expect("HMAC can take any size key");
        mac.update(data);
        mac.finalize().into_bytes().to_vec()
    }
}

/// Sign a payload with a secret
pub fn sign<T: Serialize>(payload: &T, secret: &str) -> Result<String> {
    WebhookSignature::new(secret).sign(payload)
}

/// Verify a received body against a hex signature
pub fn verify(payload: &[u8], signature: &str, secret: &str) -> bool {
    WebhookSignature::new(secret).verify(payload, signature)
}

/// Header names for outbound deliveries
pub mod headers {
    /// Event type header
    pub const EVENT: &str = "X-DVCS-Event";

    /// Hex HMAC-SHA256 signature header
    pub const SIGNATURE: &str = "X-DVCS-Signature";

    /// Per-attempt delivery identifier header
    pub const DELIVERY: &str = "X-DVCS-Delivery";
}
