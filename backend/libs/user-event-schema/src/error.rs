//! Error types for the user event schema

use crate::UserEventType;
use thiserror::Error;

/// Result type for schema operations
pub type SchemaResult<T> = Result<T, SchemaError>;

#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("failed to encode user event: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("failed to decode user event: {0}")]
    Decode(#[source] serde_json::Error),

    /// Registry does not cover every event type
    #[error("no topic registered for event type {0}")]
    MissingTopic(UserEventType),

    #[error("event type {0} registered more than once")]
    DuplicateEventType(UserEventType),

    #[error("topic '{topic}' is mapped from both {first} and {second}")]
    DuplicateTopic {
        topic: String,
        first: UserEventType,
        second: UserEventType,
    },

    #[error("empty topic name for event type {0}")]
    EmptyTopicName(UserEventType),

    #[error("topic '{0}' must have at least one partition")]
    InvalidPartitions(String),
}
