//! Topic-bound Kafka consumer
//!
//! Each consumer owns one reader subscribed to one topic under one consumer
//! group and runs a fetch → decode → handle → commit loop until shutdown.
//!
//! Delivery is at-least-once: an offset is committed only after the message
//! decoded and the handler succeeded. Messages that fail either step stay
//! uncommitted and are redelivered after a restart or rebalance.

use async_trait::async_trait;
use resilience::BackoffPolicy;
use std::borrow::Cow;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use user_event_schema::{decode_user_event, UserEvent};

use super::{InboundMessage, KafkaError, MessageReader};

/// Receives every successfully decoded event of a lane
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle(&self, event: UserEvent) -> anyhow::Result<()>;
}

pub struct KafkaConsumer<R> {
    reader: R,
    topic: String,
    group_id: String,
    backoff: Arc<dyn BackoffPolicy>,
}

impl<R: MessageReader> KafkaConsumer<R> {
    pub fn new(
        reader: R,
        topic: impl Into<String>,
        group_id: impl Into<String>,
        backoff: Arc<dyn BackoffPolicy>,
    ) -> Self {
        Self {
            reader,
            topic: topic.into(),
            group_id: group_id.into(),
            backoff,
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn group_id(&self) -> &str {
        &self.group_id
    }

    /// Run the consume loop until `shutdown` is cancelled.
    ///
    /// Per-message failures are logged and never end the loop. The only
    /// return value is `Err(KafkaError::Cancelled)` once shutdown is observed,
    /// including while a fetch, commit or backoff wait is in flight.
    pub async fn consume_messages<H>(
        &mut self,
        shutdown: &CancellationToken,
        handler: &H,
    ) -> Result<(), KafkaError>
    where
        H: EventHandler + ?Sized,
    {
        info!(
            topic = %self.topic,
            group_id = %self.group_id,
            "Starting consumer"
        );

        let mut fetch_failures: u32 = 0;

        loop {
            if shutdown.is_cancelled() {
                return Err(self.stopped());
            }

            let fetched = tokio::select! {
                biased;
                _ = shutdown.cancelled() => None,
                fetched = self.reader.fetch_message() => Some(fetched),
            };
            let Some(fetched) = fetched else {
                return Err(self.stopped());
            };

            let message = match fetched {
                Ok(message) => {
                    fetch_failures = 0;
                    message
                }
                Err(e) => {
                    fetch_failures = fetch_failures.saturating_add(1);
                    let delay = self.backoff.delay(fetch_failures);
                    error!(
                        topic = %self.topic,
                        error = %e,
                        consecutive_failures = fetch_failures,
                        retry_in_ms = delay.as_millis() as u64,
                        "Error fetching message"
                    );

                    if !delay.is_zero() {
                        let cancelled = tokio::select! {
                            biased;
                            _ = shutdown.cancelled() => true,
                            _ = tokio::time::sleep(delay) => false,
                        };
                        if cancelled {
                            return Err(self.stopped());
                        }
                    }
                    continue;
                }
            };

            let event = match decode_message(&message) {
                Ok(event) => event,
                Err(e) => {
                    warn!(
                        topic = %self.topic,
                        partition = message.partition,
                        offset = message.offset,
                        key = ?message_key(&message),
                        error = %e,
                        "Error decoding message, leaving it uncommitted"
                    );
                    continue;
                }
            };

            let event_type = event.event_type();
            if let Err(e) = handler.handle(event).await {
                error!(
                    topic = %self.topic,
                    partition = message.partition,
                    offset = message.offset,
                    key = ?message_key(&message),
                    event_type = %event_type,
                    error = ?e,
                    "Error handling event, leaving it uncommitted"
                );
                continue;
            }

            // Prefer finishing a ready commit over observing shutdown
            let committed = tokio::select! {
                biased;
                committed = self.reader.commit_message(&message) => Some(committed),
                _ = shutdown.cancelled() => None,
            };

            match committed {
                Some(Ok(())) => {
                    debug!(
                        topic = %self.topic,
                        partition = message.partition,
                        offset = message.offset,
                        "Committed offset"
                    );
                }
                Some(Err(e)) => {
                    warn!(
                        topic = %self.topic,
                        partition = message.partition,
                        offset = message.offset,
                        error = %e,
                        "Error committing message"
                    );
                }
                None => return Err(self.stopped()),
            }
        }
    }

    /// Release the reader, reporting failures against this consumer's topic
    pub fn close(self) -> Result<(), KafkaError> {
        let topic = self.topic;
        self.reader
            .close()
            .map_err(|source| KafkaError::CloseReader {
                topic: topic.clone(),
                source: Box::new(source),
            })?;

        info!(topic = %topic, "Consumer closed");
        Ok(())
    }

    fn stopped(&self) -> KafkaError {
        info!(topic = %self.topic, "Consumer stopped");
        KafkaError::Cancelled {
            topic: self.topic.clone(),
        }
    }
}

/// Message key for logs, lossily decoded as UTF-8
fn message_key(message: &InboundMessage) -> Option<Cow<'_, str>> {
    message.key.as_deref().map(String::from_utf8_lossy)
}

fn decode_message(message: &InboundMessage) -> Result<UserEvent, KafkaError> {
    let payload = message
        .payload
        .as_deref()
        .ok_or_else(|| KafkaError::EmptyPayload {
            topic: message.topic.clone(),
            offset: message.offset,
        })?;

    Ok(decode_user_event(payload)?)
}
