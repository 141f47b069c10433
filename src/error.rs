// Error types for the notification facade

use thiserror::Error;

#[derive(Error, Debug)]
pub enum NotifierError {
    #[error(transparent)]
    Webhook(#[from] dvcs_webhooks::WebhookError),

    #[error(transparent)]
    Realtime(#[from] dvcs_realtime::RealtimeError),

    #[error(transparent)]
    Config(#[from] dvcs_config::ConfigError),
}

pub type Result<T> = std::result::Result<T, NotifierError>;
