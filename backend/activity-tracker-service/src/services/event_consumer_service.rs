//! Consumer pool: one lane per registered event type
//!
//! Each lane is a `KafkaConsumer` running in its own task. Lanes share only
//! the shutdown token, the read-only topic registry and the session sink, so
//! a failing topic cannot stall or fail any other topic.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use user_event_schema::{TopicRegistry, TopicSpec, UserEvent};

use crate::error::{Result, ServiceError};
use crate::kafka::{EventHandler, KafkaConsumer, KafkaError, MessageReader};

/// Sink for decoded user events
#[async_trait]
pub trait SessionRepository: Send + Sync {
    async fn track_user_action(&self, event: &UserEvent) -> anyhow::Result<()>;
}

/// Lane handler that hands every event to the session sink
struct SessionForwarder {
    repository: Arc<dyn SessionRepository>,
}

#[async_trait]
impl EventHandler for SessionForwarder {
    async fn handle(&self, event: UserEvent) -> anyhow::Result<()> {
        self.repository.track_user_action(&event).await
    }
}

pub struct EventConsumerService<R> {
    consumers: Vec<KafkaConsumer<R>>,
    session_repository: Arc<dyn SessionRepository>,
    registry: Arc<TopicRegistry>,
}

impl<R: MessageReader + 'static> EventConsumerService<R> {
    /// Build one consumer per registered topic using `consumer_factory`
    pub fn new<F>(
        session_repository: Arc<dyn SessionRepository>,
        registry: Arc<TopicRegistry>,
        mut consumer_factory: F,
    ) -> std::result::Result<Self, KafkaError>
    where
        F: FnMut(&TopicSpec) -> std::result::Result<KafkaConsumer<R>, KafkaError>,
    {
        let consumers = registry
            .topics()
            .map(|spec| consumer_factory(spec))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        info!(
            consumers = consumers.len(),
            topics = ?registry.topics().map(|s| s.name.as_str()).collect::<Vec<_>>(),
            "Event consumers created"
        );

        Ok(Self {
            consumers,
            session_repository,
            registry,
        })
    }

    pub fn registry(&self) -> &TopicRegistry {
        &self.registry
    }

    /// Topics of the consumers currently held by the pool
    pub fn consumer_topics(&self) -> Vec<&str> {
        self.consumers.iter().map(|c| c.topic()).collect()
    }

    /// Run every lane until `shutdown` is cancelled.
    ///
    /// Returns only after all lanes have stopped. Consumers are handed back
    /// to the pool as their lanes finish so `close` can release them.
    pub async fn listen_for_user_events(&mut self, shutdown: CancellationToken) -> Result<()> {
        let mut lanes = JoinSet::new();

        for mut consumer in self.consumers.drain(..) {
            let shutdown = shutdown.clone();
            let handler = SessionForwarder {
                repository: Arc::clone(&self.session_repository),
            };

            lanes.spawn(async move {
                let outcome = consumer.consume_messages(&shutdown, &handler).await;
                (consumer, outcome)
            });
        }

        info!(lanes = lanes.len(), "Listening for user events");

        let mut aborted = 0;
        while let Some(joined) = lanes.join_next().await {
            match joined {
                Ok((consumer, Err(KafkaError::Cancelled { topic }))) => {
                    debug!(
                        topic = %topic,
                        group_id = %consumer.group_id(),
                        "Consumer lane finished"
                    );
                    self.consumers.push(consumer);
                }
                Ok((consumer, outcome)) => {
                    warn!(
                        topic = %consumer.topic(),
                        group_id = %consumer.group_id(),
                        outcome = ?outcome,
                        "Consumer lane finished without observing shutdown"
                    );
                    self.consumers.push(consumer);
                }
                Err(e) => {
                    error!(error = %e, "Consumer lane aborted");
                    aborted += 1;
                }
            }
        }

        info!(
            stopped = self.consumers.len(),
            aborted,
            "All consumer lanes stopped"
        );

        if aborted > 0 {
            return Err(ServiceError::LaneAborted { failed: aborted });
        }
        Ok(())
    }

    /// Close every consumer, returning the first failure
    pub fn close(self) -> std::result::Result<(), KafkaError> {
        let mut first_error = None;

        for consumer in self.consumers {
            let topic = consumer.topic().to_string();
            if let Err(e) = consumer.close() {
                error!(topic = %topic, error = %e, "Failed to close consumer");
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
