// DVCS Events - repository event notifications
//
// Fans repository events out to registered webhooks (signed, retried, logged
// per attempt) and to live WebSocket channels.

mod error;
mod notifier;

pub use error::{NotifierError, Result};
pub use notifier::{live_kind, realtime_config, webhook_config, Notifier};

// Re-export member crates
pub use dvcs_config;
pub use dvcs_log;
pub use dvcs_realtime;
pub use dvcs_webhooks;

// Prelude for common imports
pub mod prelude {
    pub use crate::{Notifier, NotifierError};
    pub use dvcs_config::{Settings, Validate};
    pub use dvcs_realtime::{ChannelHub, OutboundKind, RealtimeServer};
    pub use dvcs_webhooks::{
        DeliveryOutcome, EventRouter, EventType, InMemoryWebhookStore, RepositoryRef,
        WebhookRegistration, WebhookStore,
    };
}
