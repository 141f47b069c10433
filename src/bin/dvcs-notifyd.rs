// Live notification daemon: serves repository channels over WebSocket.
//
// Settings come from the file named by DVCS_CONFIG (optional), a local .env
// file when present, and DVCS_* variables.

use dvcs_config::Settings;
use dvcs_events::Notifier;
use dvcs_webhooks::InMemoryWebhookStore;
use std::path::Path;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    dvcs_log::init();

    if let Err(e) = run().await {
        tracing::error!(error = %e, "dvcs-notifyd failed");
        std::process::exit(1);
    }
}

async fn run() -> dvcs_events::Result<()> {
    let mut loader = Settings::loader();
    if let Ok(path) = std::env::var("DVCS_CONFIG") {
        loader = loader.file(path);
    }
    if Path::new(".env").exists() {
        loader = loader.dotenv(".env");
    }
    let settings = loader.load()?;

    let notifier = Notifier::from_settings(&settings, Arc::new(InMemoryWebhookStore::new()))?;
    let server = notifier.bind_realtime(&settings.realtime).await?;
    tracing::info!(addr = %server.local_addr()?, "Accepting repository channels");

    tokio::select! {
        result = server.run() => result?,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutting down");
        }
    }

    Ok(())
}
