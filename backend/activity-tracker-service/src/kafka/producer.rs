//! Kafka producer for user activity events
//!
//! Serializes payloads to JSON and hands them to the writer as a single
//! batch. The batch is not atomic: messages the broker accepted before a
//! failure stay published.

use serde::Serialize;
use tracing::{debug, info};

use super::{KafkaError, MessageWriter, OutboundMessage, RdKafkaWriter};
use crate::config::KafkaConfig;

pub struct KafkaProducer<W> {
    writer: W,
    client_id: String,
}

impl KafkaProducer<RdKafkaWriter> {
    /// Create a producer backed by rdkafka
    pub fn connect(config: &KafkaConfig) -> Result<Self, KafkaError> {
        let writer = RdKafkaWriter::new(config)?;
        Ok(Self::new(writer, config.client_id.clone()))
    }
}

impl<W: MessageWriter> KafkaProducer<W> {
    pub fn new(writer: W, client_id: impl Into<String>) -> Self {
        Self {
            writer,
            client_id: client_id.into(),
        }
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Publish each payload as a JSON message on `topic` under `key`.
    ///
    /// All payloads are serialized before anything is written, so a
    /// serialization failure publishes nothing. Transport failures return the
    /// first error; earlier messages from the same call are not rolled back.
    pub async fn publish_json<T: Serialize>(
        &self,
        topic: &str,
        key: &str,
        payloads: &[T],
    ) -> Result<(), KafkaError> {
        if payloads.is_empty() {
            debug!(topic = %topic, "Nothing to publish");
            return Ok(());
        }

        let messages = payloads
            .iter()
            .map(|payload| -> Result<OutboundMessage, KafkaError> {
                Ok(OutboundMessage {
                    topic: topic.to_string(),
                    key: key.to_string(),
                    value: serde_json::to_vec(payload)?,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let count = messages.len();
        self.writer.write_messages(messages).await?;

        debug!(topic = %topic, key = %key, count, "Published messages to Kafka");
        Ok(())
    }

    /// Flush and release the writer
    pub async fn close(self) -> Result<(), KafkaError> {
        self.writer
            .close()
            .await
            .map_err(|source| KafkaError::CloseWriter {
                client_id: self.client_id.clone(),
                source: Box::new(source),
            })?;

        info!(client_id = %self.client_id, "Kafka producer closed");
        Ok(())
    }
}
