use chrono::{DateTime, Utc};
/// Event schema for the user activity topics
///
/// This library defines the `UserEvent` payload shared by producers and
/// consumers, its JSON wire codec, and the `TopicRegistry` that routes each
/// event type to exactly one Kafka topic.
use serde::{Deserialize, Serialize};

pub mod error;
pub mod registry;

pub use error::{SchemaError, SchemaResult};
pub use registry::{TopicRegistry, TopicSpec};

/// Kind of user activity carried by a [`UserEvent`].
///
/// Wire names keep the hyphenated form used by existing producers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum UserEventType {
    #[serde(rename = "LOGIN")]
    Login,
    #[serde(rename = "PAGE-VIEWS")]
    PageViews,
    #[serde(rename = "USER-ACTION")]
    UserAction,
}

impl UserEventType {
    /// Every variant, in declaration order
    pub const ALL: [UserEventType; 3] = [
        UserEventType::Login,
        UserEventType::PageViews,
        UserEventType::UserAction,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            UserEventType::Login => "LOGIN",
            UserEventType::PageViews => "PAGE-VIEWS",
            UserEventType::UserAction => "USER-ACTION",
        }
    }
}

impl std::fmt::Display for UserEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single user activity event.
///
/// Serialized as `{"userID": "...", "timestamp": "<RFC 3339>", "type": "LOGIN"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserEvent {
    #[serde(rename = "userID")]
    user_id: String,
    timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    event_type: UserEventType,
}

impl UserEvent {
    pub fn new(
        user_id: impl Into<String>,
        timestamp: DateTime<Utc>,
        event_type: UserEventType,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            timestamp,
            event_type,
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn event_type(&self) -> UserEventType {
        self.event_type
    }
}

/// Encode an event into its canonical JSON message value
pub fn encode_user_event(event: &UserEvent) -> SchemaResult<Vec<u8>> {
    serde_json::to_vec(event).map_err(SchemaError::Encode)
}

/// Decode a message value into an event.
///
/// Unknown `type` strings are rejected rather than mapped to a default.
pub fn decode_user_event(payload: &[u8]) -> SchemaResult<UserEvent> {
    serde_json::from_slice(payload).map_err(SchemaError::Decode)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 14, 9, 26, 53).unwrap()
    }

    #[test]
    fn test_wire_format() {
        let event = UserEvent::new("42", fixed_time(), UserEventType::Login);

        let json = String::from_utf8(encode_user_event(&event).unwrap()).unwrap();
        assert_eq!(
            json,
            r#"{"userID":"42","timestamp":"2025-03-14T09:26:53Z","type":"LOGIN"}"#
        );
    }

    #[test]
    fn test_hyphenated_type_names() {
        let page_view = UserEvent::new("7", fixed_time(), UserEventType::PageViews);
        let action = UserEvent::new("7", fixed_time(), UserEventType::UserAction);

        let page_view_json = serde_json::to_value(&page_view).unwrap();
        let action_json = serde_json::to_value(&action).unwrap();
        assert_eq!(page_view_json["type"], "PAGE-VIEWS");
        assert_eq!(action_json["type"], "USER-ACTION");
    }

    #[test]
    fn test_decode_accepts_offset_timestamps() {
        let payload = br#"{"userID":"9","timestamp":"2025-03-14T11:26:53+02:00","type":"PAGE-VIEWS"}"#;

        let event = decode_user_event(payload).unwrap();
        assert_eq!(event.user_id(), "9");
        assert_eq!(event.timestamp(), fixed_time());
        assert_eq!(event.event_type(), UserEventType::PageViews);
    }

    #[test]
    fn test_decode_rejects_unknown_type() {
        let payload = br#"{"userID":"9","timestamp":"2025-03-14T09:26:53Z","type":"LOGOUT"}"#;

        let err = decode_user_event(payload).unwrap_err();
        assert!(matches!(err, SchemaError::Decode(_)));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(decode_user_event(b"not json").is_err());
        assert!(decode_user_event(b"{}").is_err());
        assert!(decode_user_event(b"").is_err());
    }

    #[test]
    fn test_event_type_display() {
        let names: Vec<String> = UserEventType::ALL.iter().map(|t| t.to_string()).collect();
        assert_eq!(names, vec!["LOGIN", "PAGE-VIEWS", "USER-ACTION"]);
    }
}
