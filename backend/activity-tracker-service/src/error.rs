/// Error types for the activity tracker service
use thiserror::Error;

use crate::kafka::KafkaError;

/// Result type for service operations
pub type Result<T> = std::result::Result<T, ServiceError>;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to load configuration: {0}")]
    ConfigSource(#[from] ::config::ConfigError),

    #[error(transparent)]
    Kafka(#[from] KafkaError),

    /// A lane task panicked or was aborted instead of observing shutdown
    #[error("{failed} consumer lane(s) aborted before observing shutdown")]
    LaneAborted { failed: usize },
}
