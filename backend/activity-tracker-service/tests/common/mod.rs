//! In-memory transports and recording sinks shared by the integration tests

#![allow(dead_code)]

use activity_tracker_service::kafka::{
    EventHandler, InboundMessage, KafkaError, MessageReader, MessageWriter, OutboundMessage,
};
use activity_tracker_service::services::SessionRepository;
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;
use user_event_schema::{encode_user_event, UserEvent, UserEventType};

/// Observable side of a [`FakeReader`], shared with the test body
#[derive(Debug, Default)]
pub struct ReaderLog {
    pub commits: Mutex<Vec<i64>>,
    pub fetches: AtomicUsize,
    pub closed: AtomicBool,
    /// Signalled once the scripted messages are used up
    pub drained: Notify,
    /// Signalled when a commit starts hanging in pending-commit mode
    pub commit_blocked: Notify,
}

impl ReaderLog {
    pub fn committed(&self) -> Vec<i64> {
        self.commits.lock().unwrap().clone()
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

/// Reader that replays a fixed script, then blocks like an idle topic
pub struct FakeReader {
    script: VecDeque<Result<InboundMessage, KafkaError>>,
    log: Arc<ReaderLog>,
    fail_commits: bool,
    hang_commits: bool,
    fail_close: bool,
}

impl FakeReader {
    pub fn new(script: Vec<Result<InboundMessage, KafkaError>>) -> (Self, Arc<ReaderLog>) {
        let log = Arc::new(ReaderLog::default());
        let reader = Self {
            script: script.into(),
            log: Arc::clone(&log),
            fail_commits: false,
            hang_commits: false,
            fail_close: false,
        };
        (reader, log)
    }

    pub fn failing_commits(mut self) -> Self {
        self.fail_commits = true;
        self
    }

    /// Commits never complete, like a broker that stopped answering
    pub fn pending_commits(mut self) -> Self {
        self.hang_commits = true;
        self
    }

    pub fn failing_close(mut self) -> Self {
        self.fail_close = true;
        self
    }
}

#[async_trait]
impl MessageReader for FakeReader {
    async fn fetch_message(&mut self) -> Result<InboundMessage, KafkaError> {
        self.log.fetches.fetch_add(1, Ordering::SeqCst);
        match self.script.pop_front() {
            Some(next) => next,
            None => {
                self.log.drained.notify_one();
                std::future::pending().await
            }
        }
    }

    async fn commit_message(&mut self, message: &InboundMessage) -> Result<(), KafkaError> {
        if self.fail_commits {
            return Err(KafkaError::Transport("commit rejected".to_string()));
        }
        if self.hang_commits {
            self.log.commit_blocked.notify_one();
            return std::future::pending().await;
        }
        self.log.commits.lock().unwrap().push(message.offset);
        Ok(())
    }

    fn close(self) -> Result<(), KafkaError> {
        if self.fail_close {
            return Err(KafkaError::Transport("connection reset".to_string()));
        }
        self.log.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// Writer that records every batch it is handed
#[derive(Debug, Default)]
pub struct FakeWriter {
    pub batches: Arc<Mutex<Vec<Vec<OutboundMessage>>>>,
    pub fail_writes: bool,
    pub fail_close: bool,
}

impl FakeWriter {
    pub fn new() -> (Self, Arc<Mutex<Vec<Vec<OutboundMessage>>>>) {
        let writer = Self::default();
        let batches = Arc::clone(&writer.batches);
        (writer, batches)
    }
}

#[async_trait]
impl MessageWriter for FakeWriter {
    async fn write_messages(&self, messages: Vec<OutboundMessage>) -> Result<(), KafkaError> {
        if self.fail_writes {
            return Err(KafkaError::Transport("broker unavailable".to_string()));
        }
        self.batches.lock().unwrap().push(messages);
        Ok(())
    }

    async fn close(&self) -> Result<(), KafkaError> {
        if self.fail_close {
            return Err(KafkaError::Transport("flush timed out".to_string()));
        }
        Ok(())
    }
}

/// Handler that records events and optionally rejects all of them
#[derive(Debug, Default)]
pub struct RecordingHandler {
    pub events: Mutex<Vec<UserEvent>>,
    pub fail: bool,
}

impl RecordingHandler {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn handled(&self) -> usize {
        self.events.lock().unwrap().len()
    }
}

#[async_trait]
impl EventHandler for RecordingHandler {
    async fn handle(&self, event: UserEvent) -> anyhow::Result<()> {
        self.events.lock().unwrap().push(event);
        if self.fail {
            anyhow::bail!("session store unavailable");
        }
        Ok(())
    }
}

/// Session sink that rejects one event type and records the rest
#[derive(Debug, Default)]
pub struct SelectiveSessions {
    pub reject: Option<UserEventType>,
    pub tracked: Mutex<Vec<UserEvent>>,
}

#[async_trait]
impl SessionRepository for SelectiveSessions {
    async fn track_user_action(&self, event: &UserEvent) -> anyhow::Result<()> {
        if self.reject == Some(event.event_type()) {
            anyhow::bail!("cannot track {}", event.event_type());
        }
        self.tracked.lock().unwrap().push(event.clone());
        Ok(())
    }
}

pub fn event(user_id: &str, event_type: UserEventType) -> UserEvent {
    let at = Utc.with_ymd_and_hms(2025, 3, 14, 9, 26, 53).unwrap();
    UserEvent::new(user_id, at, event_type)
}

pub fn inbound(topic: &str, offset: i64, payload: &[u8]) -> InboundMessage {
    InboundMessage {
        topic: topic.to_string(),
        partition: 0,
        offset,
        key: None,
        payload: Some(payload.to_vec()),
    }
}

pub fn inbound_event(topic: &str, offset: i64, event: &UserEvent) -> InboundMessage {
    let mut message = inbound(topic, offset, &encode_user_event(event).unwrap());
    message.key = Some(event.user_id().as_bytes().to_vec());
    message
}
