//! In-process session store.

use async_trait::async_trait;
use dashmap::DashMap;

use crate::domain::{SessionData, SessionStore};
use crate::shared::error::AppError;

use super::{new_session_id, session_key};

/// Sessions held in a concurrent map. Expired entries are dropped when they
/// are read, and every login sweeps the ones nobody reads again.
#[derive(Default)]
pub struct MemorySessionStore {
    sessions: DashMap<String, SessionData>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn create(&self, data: &SessionData) -> Result<String, AppError> {
        self.sessions.retain(|_, s| !s.is_expired());

        let session_id = new_session_id();
        self.sessions.insert(session_key(&session_id), data.clone());
        Ok(session_id)
    }

    async fn get(&self, session_id: &str) -> Result<Option<SessionData>, AppError> {
        let key = session_key(session_id);

        let session = self.sessions.get(&key).map(|entry| entry.value().clone());
        match session {
            Some(session) if session.is_expired() => {
                self.sessions.remove(&key);
                Ok(None)
            }
            other => Ok(other),
        }
    }

    async fn destroy(&self, session_id: &str) -> Result<bool, AppError> {
        Ok(self.sessions.remove(&session_key(session_id)).is_some())
    }
}
