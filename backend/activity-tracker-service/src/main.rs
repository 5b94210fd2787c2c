use activity_tracker_service::bootstrap;
use activity_tracker_service::config::{Config, LogFormat, LoggingConfig};
use activity_tracker_service::kafka::{KafkaConsumer, RdKafkaReader};
use activity_tracker_service::services::{EventConsumerService, InMemorySessionRepository};
use anyhow::{Context, Result};
use resilience::BackoffPolicy;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use user_event_schema::TopicRegistry;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env().context("Failed to load configuration")?;
    init_tracing(&config.logging);

    info!(
        app = %config.app.name,
        version = %config.app.version,
        environment = %config.app.environment,
        brokers = ?config.kafka.brokers,
        group_id = %config.kafka.group_id,
        "Starting user activity tracker"
    );

    let registry = Arc::new(TopicRegistry::standard());

    if config.kafka.bootstrap_topics {
        bootstrap::create_topics(&config.kafka, &registry)
            .await
            .context("Failed to create Kafka topics")?;
    }

    let backoff: Arc<dyn BackoffPolicy> = Arc::new(config.backoff.policy());
    let sessions = Arc::new(InMemorySessionRepository::new());

    let kafka_config = config.kafka.clone();
    let mut service = EventConsumerService::new(sessions.clone(), registry, |spec| {
        let reader = RdKafkaReader::new(&kafka_config, &spec.name)?;
        Ok(KafkaConsumer::new(
            reader,
            spec.name.clone(),
            kafka_config.group_id.clone(),
            Arc::clone(&backoff),
        ))
    })
    .context("Failed to create Kafka consumers")?;

    let shutdown = CancellationToken::new();
    tokio::spawn(watch_for_shutdown(shutdown.clone()));

    let listened = service.listen_for_user_events(shutdown).await;

    if let Err(e) = service.close() {
        error!(error = %e, "Failed to close consumers cleanly");
    }

    info!(users = sessions.len(), "User activity tracker stopped");
    listened.context("Consumer pool failed")
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("activity_tracker_service={0},{0}", logging.level))
    });

    let registry = tracing_subscriber::registry().with(filter);
    match logging.format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

async fn watch_for_shutdown(shutdown: CancellationToken) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = sigterm.recv() => {}
                }
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }

    info!("Shutdown signal received, stopping consumers");
    shutdown.cancel();
}
