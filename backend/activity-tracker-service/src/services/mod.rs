pub mod event_consumer_service;
pub mod session_tracker;
pub mod user_event_service;

pub use event_consumer_service::{EventConsumerService, SessionRepository};
pub use session_tracker::{InMemorySessionRepository, UserSession};
pub use user_event_service::{KafkaUserEventService, UserEventService};
