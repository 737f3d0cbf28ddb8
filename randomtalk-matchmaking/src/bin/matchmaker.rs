use anyhow::{Context, Result};
use randomtalk_matchmaking::config::MatchmakingConfig;
use randomtalk_matchmaking::service::MatchmakingService;
use randomtalk_matchmaking::telemetry;

#[tokio::main]
async fn main() -> Result<()> {
    let config = MatchmakingConfig::from_env().context("failed to load configuration")?;
    telemetry::init_tracing(&config.logging);

    tracing::info!(
        service = %config.service_name,
        environment = %config.environment,
        stream = %config.persistence.stream_name,
        "starting matchmaker"
    );

    let service = MatchmakingService::build(config).context("failed to build matchmaking service")?;
    let consumer = service
        .start_consumer()
        .context("failed to start match request consumer")?;

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;
    tracing::info!("shutdown signal received");

    if let Some(consumer) = consumer {
        consumer.shutdown();
        consumer.join().await;
    }
    tracing::info!(waiting = service.pool().len(), "matchmaker stopped");
    Ok(())
}
