// Configuration for the DVCS notification services

pub mod env;
pub mod error;
pub mod loader;
pub mod settings;
pub mod validation;

pub use env::{apply_overrides, EnvLoader, ENV_PREFIX};
pub use error::{ConfigError, Result};
pub use loader::{ConfigLoader, FileFormat, SettingsLoader};
pub use settings::{RealtimeSettings, Settings, WebhookSettings, MAX_BACKOFF_LIMIT_SECS, MAX_RETRIES_LIMIT};
pub use validation::{ConfigValidator, Validate};

impl Settings {
    /// Start a layered load
    pub fn loader() -> SettingsLoader {
        SettingsLoader::new()
    }

    /// Load from the environment only
    pub fn from_env() -> Result<Self> {
        SettingsLoader::new().load()
    }
}
