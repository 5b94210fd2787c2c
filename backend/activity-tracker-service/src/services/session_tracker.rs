//! In-memory session tracking
//!
//! Default `SessionRepository` for the worker: keeps per-user activity
//! counters and timestamps. Lanes write concurrently, so sessions live in a
//! `DashMap` and timestamps only move forward.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tracing::debug;
use user_event_schema::{UserEvent, UserEventType};

use super::SessionRepository;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserSession {
    pub user_id: String,
    pub last_login: Option<DateTime<Utc>>,
    pub last_seen: Option<DateTime<Utc>>,
    pub logins: u64,
    pub page_views: u64,
    pub actions: u64,
}

impl UserSession {
    fn new(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            last_login: None,
            last_seen: None,
            logins: 0,
            page_views: 0,
            actions: 0,
        }
    }

    fn record(&mut self, event: &UserEvent) {
        let at = event.timestamp();
        match event.event_type() {
            UserEventType::Login => {
                self.logins += 1;
                self.last_login = Some(self.last_login.map_or(at, |prev| prev.max(at)));
            }
            UserEventType::PageViews => self.page_views += 1,
            UserEventType::UserAction => self.actions += 1,
        }
        self.last_seen = Some(self.last_seen.map_or(at, |prev| prev.max(at)));
    }
}

#[derive(Debug, Default)]
pub struct InMemorySessionRepository {
    sessions: DashMap<String, UserSession>,
}

impl InMemorySessionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of one user's session
    pub fn session(&self, user_id: &str) -> Option<UserSession> {
        self.sessions.get(user_id).map(|entry| entry.value().clone())
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[async_trait]
impl SessionRepository for InMemorySessionRepository {
    async fn track_user_action(&self, event: &UserEvent) -> anyhow::Result<()> {
        {
            let mut session = self
                .sessions
                .entry(event.user_id().to_string())
                .or_insert_with(|| UserSession::new(event.user_id()));
            session.record(event);
        }

        debug!(
            user_id = %event.user_id(),
            event_type = %event.event_type(),
            "Tracked user activity"
        );
        Ok(())
    }
}
