// src/session/mod.rs
//! Per-browser chat sessions: connection target, conversation memory and
//! follow-up state, kept in memory with an idle timeout.

pub mod cookie;
pub mod memory;

pub use memory::ConversationMemory;

use crate::db::ConnectionTarget;
use crate::services::follow_up::FollowUpTracker;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::RwLock;
use tokio::time::Instant;
use uuid::Uuid;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionError {
    #[error("no database connected for this session")]
    NotConnected,
    #[error("session expired")]
    Expired,
}

#[derive(Debug, Clone)]
pub struct SessionState {
    pub target: Option<ConnectionTarget>,
    pub memory: ConversationMemory,
    pub tracker: FollowUpTracker,
}

impl SessionState {
    pub fn empty(history_window: usize) -> Self {
        Self {
            target: None,
            memory: ConversationMemory::new(history_window),
            tracker: FollowUpTracker::default(),
        }
    }

    pub fn connected(target: ConnectionTarget, history_window: usize) -> Self {
        Self {
            target: Some(target),
            ..Self::empty(history_window)
        }
    }
}

/// A live session, or the tombstone the sweeper leaves behind so the next
/// request still learns that the session expired.
#[derive(Debug)]
enum SessionSlot {
    Live { state: SessionState, last_seen: Instant },
    Expired { since: Instant },
}

#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<String, SessionSlot>>>,
    ttl: Duration,
    history_window: usize,
}

impl SessionStore {
    pub fn new(ttl: Duration, history_window: usize) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            ttl,
            history_window,
        }
    }

    pub fn new_session_id() -> String {
        Uuid::new_v4().to_string()
    }

    /// Starts a fresh conversation against `target`, dropping any previous state.
    pub async fn connect(&self, id: &str, target: ConnectionTarget) {
        let state = SessionState::connected(target, self.history_window);
        self.store(id, state).await;
    }

    /// Forgets the connection and conversation but keeps the session alive.
    pub async fn reset(&self, id: &str) {
        let state = SessionState::empty(self.history_window);
        self.store(id, state).await;
    }

    /// Copy of the session's state for one chat turn. The caller writes it
    /// back with [`SessionStore::store`] when the turn is over.
    ///
    /// An expired session reports [`SessionError::Expired`] exactly once,
    /// whether or not the sweeper got to it first.
    pub async fn checkout(&self, id: &str) -> Result<SessionState, SessionError> {
        let mut sessions = self.sessions.write().await;

        let expired = match sessions.get(id) {
            None => return Err(SessionError::NotConnected),
            Some(SessionSlot::Expired { .. }) => true,
            Some(SessionSlot::Live { last_seen, .. }) => last_seen.elapsed() > self.ttl,
        };
        if expired {
            sessions.remove(id);
            tracing::info!("Session {} expired", id);
            return Err(SessionError::Expired);
        }

        match sessions.get_mut(id) {
            Some(SessionSlot::Live { state, last_seen }) if state.target.is_some() => {
                *last_seen = Instant::now();
                Ok(state.clone())
            }
            _ => Err(SessionError::NotConnected),
        }
    }

    pub async fn store(&self, id: &str, state: SessionState) {
        let mut sessions = self.sessions.write().await;
        sessions.insert(
            id.to_string(),
            SessionSlot::Live {
                state,
                last_seen: Instant::now(),
            },
        );
    }

    /// Drops the state of sessions idle for longer than the TTL, leaving an
    /// expiry marker that itself goes after another TTL. Returns how many
    /// sessions expired in this pass.
    pub async fn cleanup_expired(&self) -> usize {
        let mut sessions = self.sessions.write().await;
        let now = Instant::now();
        let mut expired = 0;

        sessions.retain(|_, slot| {
            let idle_too_long = match slot {
                SessionSlot::Expired { since } => return since.elapsed() <= self.ttl,
                SessionSlot::Live { last_seen, .. } => last_seen.elapsed() > self.ttl,
            };
            if idle_too_long {
                *slot = SessionSlot::Expired { since: now };
                expired += 1;
            }
            true
        });
        expired
    }

    /// Sessions still holding state; expiry markers are not counted.
    pub async fn active_count(&self) -> usize {
        self.sessions
            .read()
            .await
            .values()
            .filter(|slot| matches!(slot, SessionSlot::Live { .. }))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ConnectRequest;

    fn sqlite_target() -> ConnectionTarget {
        ConnectionTarget::from_request(&ConnectRequest {
            db_type: Some("sqlite".to_string()),
            db_name: Some("employees.db".to_string()),
            ..Default::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_unknown_session_is_not_connected() {
        let store = SessionStore::new(Duration::from_secs(60), 4);
        assert_eq!(store.checkout("missing").await.unwrap_err(), SessionError::NotConnected);
    }

    #[tokio::test]
    async fn test_reset_clears_connection() {
        let store = SessionStore::new(Duration::from_secs(60), 4);
        let id = SessionStore::new_session_id();
        store.connect(&id, sqlite_target()).await;
        assert!(store.checkout(&id).await.is_ok());

        store.reset(&id).await;
        assert_eq!(store.checkout(&id).await.unwrap_err(), SessionError::NotConnected);
        assert_eq!(store.active_count().await, 1);
    }

    #[tokio::test]
    async fn test_store_writes_turn_state_back() {
        let store = SessionStore::new(Duration::from_secs(60), 4);
        let id = SessionStore::new_session_id();
        store.connect(&id, sqlite_target()).await;

        let mut state = store.checkout(&id).await.unwrap();
        state.memory.record("how many?", "SELECT COUNT(*) FROM employees");
        state.tracker.record_query("SELECT COUNT(*) FROM employees", false);
        store.store(&id, state).await;

        let again = store.checkout(&id).await.unwrap();
        assert_eq!(again.memory.len(), 1);
        assert_eq!(again.tracker.last_query(), Some("SELECT COUNT(*) FROM employees"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_session_expires() {
        let store = SessionStore::new(Duration::from_secs(60), 4);
        let id = SessionStore::new_session_id();
        store.connect(&id, sqlite_target()).await;

        tokio::time::advance(Duration::from_secs(30)).await;
        assert!(store.checkout(&id).await.is_ok());

        // checkout refreshed the idle clock
        tokio::time::advance(Duration::from_secs(45)).await;
        assert!(store.checkout(&id).await.is_ok());

        tokio::time::advance(Duration::from_secs(61)).await;
        assert_eq!(store.checkout(&id).await.unwrap_err(), SessionError::Expired);
        assert_eq!(store.checkout(&id).await.unwrap_err(), SessionError::NotConnected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_swept_session_still_reports_expiry() {
        let store = SessionStore::new(Duration::from_secs(3600), 4);
        store.connect("s", sqlite_target()).await;

        tokio::time::advance(Duration::from_secs(3601)).await;
        assert_eq!(store.cleanup_expired().await, 1);
        assert_eq!(store.active_count().await, 0);

        assert_eq!(store.checkout("s").await.unwrap_err(), SessionError::Expired);
        assert_eq!(store.checkout("s").await.unwrap_err(), SessionError::NotConnected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expiry_marker_is_eventually_dropped() {
        let store = SessionStore::new(Duration::from_secs(60), 4);
        store.connect("s", sqlite_target()).await;

        tokio::time::advance(Duration::from_secs(61)).await;
        assert_eq!(store.cleanup_expired().await, 1);
        tokio::time::advance(Duration::from_secs(30)).await;
        assert_eq!(store.cleanup_expired().await, 0);
        tokio::time::advance(Duration::from_secs(31)).await;
        assert_eq!(store.cleanup_expired().await, 0);

        assert_eq!(store.checkout("s").await.unwrap_err(), SessionError::NotConnected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reconnect_replaces_expiry_marker() {
        let store = SessionStore::new(Duration::from_secs(60), 4);
        store.connect("s", sqlite_target()).await;
        tokio::time::advance(Duration::from_secs(61)).await;
        store.cleanup_expired().await;

        store.connect("s", sqlite_target()).await;
        assert!(store.checkout("s").await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cleanup_expired() {
        let store = SessionStore::new(Duration::from_secs(60), 4);
        store.connect("old", sqlite_target()).await;
        tokio::time::advance(Duration::from_secs(50)).await;
        store.connect("new", sqlite_target()).await;
        tokio::time::advance(Duration::from_secs(20)).await;

        assert_eq!(store.cleanup_expired().await, 1);
        assert_eq!(store.active_count().await, 1);
        assert!(store.checkout("new").await.is_ok());
    }
}
