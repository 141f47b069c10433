// Settings for the notification services

use crate::validation::{ConfigValidator, Validate};
use crate::Result;
use serde::{Deserialize, Serialize};

/// Upper bound on configured retries
pub const MAX_RETRIES_LIMIT: u32 = 10;

/// Upper bound for either backoff setting, in seconds
pub const MAX_BACKOFF_LIMIT_SECS: u64 = 3600;

/// Top-level settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub webhooks: WebhookSettings,
    pub realtime: RealtimeSettings,
}

/// Outbound webhook delivery settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebhookSettings {
    /// Per-attempt timeout
    pub timeout_secs: u64,
    /// Retries after the initial attempt
    pub max_retries: u32,
    /// Delay before the first retry, doubled for each further retry
    pub initial_backoff_secs: u64,
    /// Cap on the retry delay
    pub max_backoff_secs: u64,
    /// Largest payload that will be sent
    pub max_payload_size: usize,
    /// User-Agent override
    pub user_agent: Option<String>,
}

impl Default for WebhookSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            max_retries: 3,
            initial_backoff_secs: 2,
            max_backoff_secs: 60,
            max_payload_size: 1024 * 1024,
            user_agent: None,
        }
    }
}

/// Live channel server settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RealtimeSettings {
    /// `host:port` to listen on
    pub bind_addr: String,
    /// Largest inbound WebSocket message
    pub max_message_size: usize,
}

impl Default for RealtimeSettings {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:9001".to_string(),
            max_message_size: 64 * 1024,
        }
    }
}

impl Validate for WebhookSettings {
    fn validate(&self) -> Result<()> {
        ConfigValidator::positive(self.timeout_secs, "webhooks.timeout_secs")?;
        ConfigValidator::in_range(self.max_retries, 0, MAX_RETRIES_LIMIT, "webhooks.max_retries")?;
        ConfigValidator::in_range(
            self.initial_backoff_secs,
            1,
            MAX_BACKOFF_LIMIT_SECS,
            "webhooks.initial_backoff_secs",
        )?;
        ConfigValidator::in_range(
            self.max_backoff_secs,
            self.initial_backoff_secs,
            MAX_BACKOFF_LIMIT_SECS,
            "webhooks.max_backoff_secs",
        )?;
        ConfigValidator::positive(self.max_payload_size as u64, "webhooks.max_payload_size")?;
        if let Some(user_agent) = &self.user_agent {
            ConfigValidator::not_empty(user_agent, "webhooks.user_agent")?;
        }
        Ok(())
    }
}

impl Validate for RealtimeSettings {
    fn validate(&self) -> Result<()> {
        ConfigValidator::is_socket_addr(&self.bind_addr, "realtime.bind_addr")?;
        ConfigValidator::positive(self.max_message_size as u64, "realtime.max_message_size")?;
        Ok(())
    }
}

impl Validate for Settings {
    fn validate(&self) -> Result<()> {
        self.webhooks.validate()?;
        self.realtime.validate()
    }
}
