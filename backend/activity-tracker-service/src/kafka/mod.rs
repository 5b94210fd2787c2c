//! Kafka plumbing for user activity events
//!
//! This module provides:
//! - `KafkaProducer`: serializes payloads and writes them to a topic
//! - `KafkaConsumer`: topic-bound fetch → decode → handle → commit loop
//! - `MessageReader` / `MessageWriter`: transport seams, implemented on rdkafka
//!   in [`rdkafka_io`] and by in-memory fakes in tests
//!
//! Topics:
//! - user-logins: LOGIN events
//! - page-views: PAGE-VIEWS events
//! - user-actions: USER-ACTION events

use async_trait::async_trait;
use thiserror::Error;
use user_event_schema::SchemaError;

pub mod consumer;
pub mod producer;
pub mod rdkafka_io;

pub use consumer::{EventHandler, KafkaConsumer};
pub use producer::KafkaProducer;
pub use rdkafka_io::{RdKafkaReader, RdKafkaWriter};

/// Kafka integration error types
#[derive(Debug, Error)]
pub enum KafkaError {
    /// Fetch, commit, send or connect failure
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Decode error: {0}")]
    Decode(#[from] SchemaError),

    #[error("Message at {topic}@{offset} has no payload")]
    EmptyPayload { topic: String, offset: i64 },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("failed to close reader for topic {topic}: {source}")]
    CloseReader {
        topic: String,
        #[source]
        source: Box<KafkaError>,
    },

    #[error("failed to close writer {client_id}: {source}")]
    CloseWriter {
        client_id: String,
        #[source]
        source: Box<KafkaError>,
    },

    /// Terminal result of a consumer loop after shutdown was requested
    #[error("consumer for topic {topic} was cancelled")]
    Cancelled { topic: String },

    #[error("Kafka client error: {0}")]
    Client(#[from] rdkafka::error::KafkaError),
}

/// Message handed to a [`MessageWriter`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub topic: String,
    pub key: String,
    pub value: Vec<u8>,
}

/// Owned copy of a fetched record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub topic: String,
    pub partition: i32,
    pub offset: i64,
    pub key: Option<Vec<u8>>,
    pub payload: Option<Vec<u8>>,
}

/// Read side of a topic-bound connection.
///
/// `fetch_message` and `commit_message` are raced against shutdown, so
/// implementations must tolerate their futures being dropped mid-flight.
#[async_trait]
pub trait MessageReader: Send {
    /// Wait for the next message on the bound topic
    async fn fetch_message(&mut self) -> Result<InboundMessage, KafkaError>;

    /// Durably record that `message` has been processed
    async fn commit_message(&mut self, message: &InboundMessage) -> Result<(), KafkaError>;

    /// Release the underlying connection
    fn close(self) -> Result<(), KafkaError>
    where
        Self: Sized;
}

/// Write side of a producer connection
#[async_trait]
pub trait MessageWriter: Send + Sync {
    /// Send all messages in order, stopping at the first failure
    async fn write_messages(&self, messages: Vec<OutboundMessage>) -> Result<(), KafkaError>;

    /// Flush pending deliveries and release the connection
    async fn close(&self) -> Result<(), KafkaError>;
}
