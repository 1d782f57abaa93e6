//! Redis-backed session store.

use async_trait::async_trait;
use chrono::Utc;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;

use crate::domain::{SessionData, SessionStore};
use crate::shared::error::AppError;

use super::{new_session_id, session_key};

/// Session store keeping one JSON value per session, expiring with the session.
#[derive(Clone)]
pub struct RedisSessionStore {
    redis: ConnectionManager,
}

impl RedisSessionStore {
    pub fn new(redis: ConnectionManager) -> Self {
        Self { redis }
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn create(&self, data: &SessionData) -> Result<String, AppError> {
        let session_id = new_session_id();
        let value = serde_json::to_string(data)
            .map_err(|e| AppError::Internal(format!("Serialization error: {}", e)))?;
        let ttl = (data.expires_at - Utc::now()).num_seconds().max(1) as u64;

        let mut conn = self.redis.clone();
        conn.set_ex::<_, _, ()>(session_key(&session_id), value, ttl)
            .await?;

        Ok(session_id)
    }

    async fn get(&self, session_id: &str) -> Result<Option<SessionData>, AppError> {
        let mut conn = self.redis.clone();
        let value: Option<String> = conn.get(session_key(session_id)).await?;

        let Some(json) = value else {
            return Ok(None);
        };

        let session: SessionData = serde_json::from_str(&json)
            .map_err(|e| AppError::Internal(format!("Deserialization error: {}", e)))?;

        Ok((!session.is_expired()).then_some(session))
    }

    async fn destroy(&self, session_id: &str) -> Result<bool, AppError> {
        let mut conn = self.redis.clone();
        let deleted: i64 = conn.del(session_key(session_id)).await?;

        Ok(deleted > 0)
    }
}
