// Environment variable overrides

use crate::{ConfigError, Result, Settings};
use std::collections::HashMap;
use std::env;
use std::str::FromStr;

/// Prefix shared by every override variable
pub const ENV_PREFIX: &str = "DVCS";

/// Reads `DVCS_*` overrides from the process environment, falling back to
/// values read from a `.env` file.
#[derive(Debug, Clone, Default)]
pub struct EnvLoader {
    dotenv: HashMap<String, String>,
}

impl EnvLoader {
    /// Create a loader over the process environment only
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the variables of a `.env` file as fallbacks
    pub fn with_dotenv(mut self, path: &str) -> Result<Self> {
        let entries = dotenvy::from_path_iter(path)
            .map_err(|e| ConfigError::LoadError(format!("Failed to read {}: {}", path, e)))?;

        for entry in entries {
            let (key, value) = entry.map_err(|e| ConfigError::ParseError(e.to_string()))?;
            self.dotenv.insert(key, value);
        }

        Ok(self)
    }

    /// Look up `DVCS_<KEY>`; the process environment wins over `.env`
    pub fn load_var(&self, key: &str) -> Option<String> {
        let full_key = format!("{}_{}", ENV_PREFIX, key.to_uppercase());
        env::var(&full_key)
            .ok()
            .or_else(|| self.dotenv.get(&full_key).cloned())
    }

    /// Apply every known override to `settings`
    pub fn apply(&self, settings: &mut Settings) -> Result<()> {
        apply_overrides(settings, |key| self.load_var(key))
    }
}

/// Apply overrides using `lookup(KEY)` for each `DVCS_<KEY>` variable
pub fn apply_overrides(
    settings: &mut Settings,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<()> {
    let webhooks = &mut settings.webhooks;
    override_parsed(&lookup, "WEBHOOK_TIMEOUT_SECS", &mut webhooks.timeout_secs)?;
    override_parsed(&lookup, "WEBHOOK_MAX_RETRIES", &mut webhooks.max_retries)?;
    override_parsed(
        &lookup,
        "WEBHOOK_INITIAL_BACKOFF_SECS",
        &mut webhooks.initial_backoff_secs,
    )?;
    override_parsed(&lookup, "WEBHOOK_MAX_BACKOFF_SECS", &mut webhooks.max_backoff_secs)?;
    override_parsed(&lookup, "WEBHOOK_MAX_PAYLOAD_SIZE", &mut webhooks.max_payload_size)?;
    if let Some(user_agent) = lookup("WEBHOOK_USER_AGENT") {
        webhooks.user_agent = Some(user_agent);
    }

    let realtime = &mut settings.realtime;
    if let Some(bind_addr) = lookup("REALTIME_BIND_ADDR") {
        realtime.bind_addr = bind_addr;
    }
    override_parsed(&lookup, "REALTIME_MAX_MESSAGE_SIZE", &mut realtime.max_message_size)?;

    Ok(())
}

fn override_parsed<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    target: &mut T,
) -> Result<()> {
    if let Some(raw) = lookup(key) {
        *target = raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
            key: format!("{}_{}", ENV_PREFIX, key),
            value: raw.clone(),
        })?;
    }
    Ok(())
}
