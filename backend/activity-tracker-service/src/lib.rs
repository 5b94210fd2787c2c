//! User activity tracker
//!
//! Publishes user activity events to per-type Kafka topics and consumes them
//! with one independent consumer per topic.

pub mod bootstrap;
pub mod config;
pub mod error;
pub mod kafka;
pub mod services;

pub use config::Config;
pub use error::{Result, ServiceError};
pub use kafka::{KafkaConsumer, KafkaError, KafkaProducer, MessageReader, MessageWriter};
pub use services::{
    EventConsumerService, InMemorySessionRepository, KafkaUserEventService, SessionRepository,
    UserEventService,
};
