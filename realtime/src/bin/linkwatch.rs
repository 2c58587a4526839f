// Watch live telemetry channels named in the environment
use groundlink_common::{LinkConfig, Update};
use groundlink_realtime::{Provider, RealtimeProvider};
use std::sync::Arc;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let config = LinkConfig::from_env()?;
    let channels: Vec<String> = std::env::var("GROUNDLINK_CHANNELS")
        .unwrap_or_else(|_| "events".to_string())
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    info!(url = %config.url, instance = %config.instance, "starting linkwatch");
    let provider = RealtimeProvider::connect(config)?;

    let mut handles = Vec::new();
    for channel in &channels {
        let subscriber = Arc::new(|update: Update| match update {
            Update::Parameter(sample) => info!(
                channel = %sample.channel,
                value = ?sample.value,
                violation = ?sample.violation,
                "sample"
            ),
            Update::Event(event) => info!(
                severity = ?event.severity(),
                message = ?event.message(),
                "event"
            ),
        });
        match provider.subscribe(channel, subscriber) {
            Ok(handle) => handles.push(handle),
            Err(e) => warn!("cannot subscribe to {channel}: {e}"),
        }
    }

    info!("watching {} channel(s); Ctrl-C to exit", handles.len());
    tokio::signal::ctrl_c().await?;

    for handle in &handles {
        handle.unsubscribe();
    }
    provider.shutdown();
    Ok(())
}
