//! One-time topic bootstrap
//!
//! Creates every topic in the registry with its partition count. Topics
//! that already exist are left untouched.

use rdkafka::admin::{AdminClient, AdminOptions, NewTopic, TopicReplication};
use rdkafka::client::DefaultClientContext;
use rdkafka::config::ClientConfig;
use rdkafka::types::RDKafkaErrorCode;
use std::time::Duration;
use tracing::info;
use user_event_schema::TopicRegistry;

use crate::config::KafkaConfig;
use crate::kafka::KafkaError;

/// Topics to create for `registry`, in registry order
pub fn new_topics(registry: &TopicRegistry, replication_factor: i32) -> Vec<NewTopic<'_>> {
    registry
        .topics()
        .map(|spec| {
            NewTopic::new(
                &spec.name,
                spec.partitions,
                TopicReplication::Fixed(replication_factor),
            )
        })
        .collect()
}

pub async fn create_topics(
    config: &KafkaConfig,
    registry: &TopicRegistry,
) -> Result<(), KafkaError> {
    let admin: AdminClient<DefaultClientContext> = ClientConfig::new()
        .set("bootstrap.servers", config.brokers.join(","))
        .set("client.id", &config.client_id)
        .create()?;

    let topics = new_topics(registry, config.replication_factor);
    let options = AdminOptions::new().operation_timeout(Some(Duration::from_secs(30)));

    let results = admin.create_topics(topics.iter(), &options).await?;

    for result in results {
        match result {
            Ok(topic) => info!(topic = %topic, "Created topic"),
            Err((topic, RDKafkaErrorCode::TopicAlreadyExists)) => {
                info!(topic = %topic, "Topic already exists")
            }
            Err((topic, code)) => {
                return Err(KafkaError::Transport(format!(
                    "failed to create topic {topic}: {code}"
                )));
            }
        }
    }

    Ok(())
}
