//! Publishing side of the pipeline
//!
//! Routes a `UserEvent` to the topic registered for its type, keyed by the
//! numeric user id so all events of one user land on the same partition.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;
use user_event_schema::{TopicRegistry, UserEvent};

use crate::kafka::{KafkaError, KafkaProducer, MessageWriter};

#[async_trait]
pub trait UserEventService: Send + Sync {
    async fn send_user_event(&self, user_id: i64, event: &UserEvent) -> Result<(), KafkaError>;
}

pub struct KafkaUserEventService<W> {
    producer: KafkaProducer<W>,
    registry: Arc<TopicRegistry>,
}

impl<W: MessageWriter> KafkaUserEventService<W> {
    pub fn new(producer: KafkaProducer<W>, registry: Arc<TopicRegistry>) -> Self {
        Self { producer, registry }
    }

    /// Release the underlying producer
    pub async fn close(self) -> Result<(), KafkaError> {
        self.producer.close().await
    }
}

#[async_trait]
impl<W: MessageWriter> UserEventService for KafkaUserEventService<W> {
    async fn send_user_event(&self, user_id: i64, event: &UserEvent) -> Result<(), KafkaError> {
        let topic = self.registry.topic_for(event.event_type());
        let key = user_id.to_string();

        self.producer
            .publish_json(topic, &key, std::slice::from_ref(event))
            .await?;

        debug!(
            user_id,
            topic = %topic,
            event_type = %event.event_type(),
            "User event sent"
        );
        Ok(())
    }
}
