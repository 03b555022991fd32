// Main entry point for the Grace server core.

use anyhow::{Context, Result};
use grace_server::{Config, ServerContext};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,grace_server=debug,grace_actors=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_line_number(true),
        )
        .init();

    tracing::info!("Starting Grace server core");

    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!(topic = %config.pubsub_topic, "Configuration loaded");

    // One-shot wiring: platform services, read models, actor kinds, and
    // the readiness wait on the state store.
    let context = ServerContext::initialize(config)
        .await
        .context("Failed to initialize server context")?;

    tracing::info!("Entity actors registered; awaiting transport");

    // The HTTP transport mounts on top of the pipeline; without it the
    // process idles until shutdown.
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;

    tracing::info!("Shutting down");
    context.reminders.stop();
    Ok(())
}
