//! rdkafka-backed reader and writer

use async_trait::async_trait;
use rdkafka::config::ClientConfig;
use rdkafka::consumer::{CommitMode, Consumer, StreamConsumer};
use rdkafka::message::Message;
use rdkafka::producer::{FutureProducer, FutureRecord, Producer};
use rdkafka::util::Timeout;
use rdkafka::{Offset, TopicPartitionList};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use super::{InboundMessage, KafkaError, MessageReader, MessageWriter, OutboundMessage};
use crate::config::KafkaConfig;

/// Stream consumer subscribed to exactly one topic, with manual commits
pub struct RdKafkaReader {
    consumer: Arc<StreamConsumer>,
    topic: String,
}

impl RdKafkaReader {
    /// Build the consumer and subscribe it to `topic`.
    ///
    /// Must be called inside a Tokio runtime.
    pub fn new(config: &KafkaConfig, topic: &str) -> Result<Self, KafkaError> {
        let consumer: StreamConsumer = ClientConfig::new()
            .set("bootstrap.servers", config.brokers.join(","))
            .set("group.id", &config.group_id)
            .set("client.id", &config.client_id)
            .set("enable.auto.commit", "false") // Commit only after the handler succeeds
            .set("auto.offset.reset", "earliest")
            .set("session.timeout.ms", config.session_timeout_ms.to_string())
            .set("enable.partition.eof", "false")
            .create()?;

        consumer.subscribe(&[topic])?;

        info!(
            brokers = ?config.brokers,
            topic = %topic,
            group_id = %config.group_id,
            "Kafka reader subscribed"
        );

        Ok(Self {
            consumer: Arc::new(consumer),
            topic: topic.to_string(),
        })
    }
}

#[async_trait]
impl MessageReader for RdKafkaReader {
    async fn fetch_message(&mut self) -> Result<InboundMessage, KafkaError> {
        let message = self
            .consumer
            .recv()
            .await
            .map_err(|e| KafkaError::Transport(e.to_string()))?;

        Ok(InboundMessage {
            topic: message.topic().to_string(),
            partition: message.partition(),
            offset: message.offset(),
            key: message.key().map(<[u8]>::to_vec),
            payload: message.payload().map(<[u8]>::to_vec),
        })
    }

    async fn commit_message(&mut self, message: &InboundMessage) -> Result<(), KafkaError> {
        // The committed offset is the next one to read
        let mut offsets = TopicPartitionList::new();
        offsets.add_partition_offset(
            &message.topic,
            message.partition,
            Offset::Offset(message.offset + 1),
        )?;

        let consumer = Arc::clone(&self.consumer);
        tokio::task::spawn_blocking(move || consumer.commit(&offsets, CommitMode::Sync))
            .await
            .map_err(|e| KafkaError::Transport(format!("commit task failed: {e}")))?
            .map_err(|e| KafkaError::Transport(e.to_string()))
    }

    fn close(self) -> Result<(), KafkaError> {
        self.consumer.unsubscribe();
        info!(topic = %self.topic, "Kafka reader unsubscribed");
        Ok(())
    }
}

/// Future producer with idempotent delivery
pub struct RdKafkaWriter {
    producer: FutureProducer,
    delivery_timeout: Duration,
}

impl RdKafkaWriter {
    pub fn new(config: &KafkaConfig) -> Result<Self, KafkaError> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", config.brokers.join(","))
            .set("client.id", &config.client_id)
            .set("message.timeout.ms", config.delivery_timeout_ms.to_string())
            .set("enable.idempotence", "true")
            .set("acks", "all")
            .set("max.in.flight.requests.per.connection", "5")
            .create()?;

        info!(
            brokers = ?config.brokers,
            client_id = %config.client_id,
            "Kafka producer created"
        );

        Ok(Self {
            producer,
            delivery_timeout: Duration::from_millis(config.delivery_timeout_ms),
        })
    }
}

#[async_trait]
impl MessageWriter for RdKafkaWriter {
    async fn write_messages(&self, messages: Vec<OutboundMessage>) -> Result<(), KafkaError> {
        for message in &messages {
            let record = FutureRecord::to(&message.topic)
                .key(&message.key)
                .payload(&message.value);

            self.producer
                .send(record, self.delivery_timeout)
                .await
                .map_err(|(err, _)| {
                    KafkaError::Transport(format!(
                        "failed to deliver to {}: {}",
                        message.topic, err
                    ))
                })?;
        }
        Ok(())
    }

    async fn close(&self) -> Result<(), KafkaError> {
        let producer = self.producer.clone();
        let timeout = self.delivery_timeout;

        tokio::task::spawn_blocking(move || producer.flush(Timeout::After(timeout)))
            .await
            .map_err(|e| KafkaError::Transport(format!("flush task failed: {e}")))??;
        Ok(())
    }
}
