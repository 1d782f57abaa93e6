//! Server-side session state and its store trait.
//!
//! A session is created at login and referenced by an opaque id carried in
//! an HTTP-only cookie. It holds exactly what the authorization check needs:
//! the user id, username and role captured at login time.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::error::AppError;

use super::user::User;

/// Data stored for one logged-in browser session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionData {
    pub user_id: i64,
    pub username: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl SessionData {
    /// Capture the session fields for `user`, valid for `ttl_seconds`.
    pub fn for_user(user: &User, ttl_seconds: u64) -> Self {
        let now = Utc::now();
        Self {
            user_id: user.id,
            username: user.username.clone(),
            role: user.role.clone(),
            created_at: now,
            expires_at: now + Duration::seconds(ttl_seconds as i64),
        }
    }

    /// Check if the session has expired.
    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }
}

/// Storage for server-side sessions.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Persist a session and return its newly generated opaque id.
    async fn create(&self, data: &SessionData) -> Result<String, AppError>;

    /// Look up a live session. Expired sessions read as `None`.
    async fn get(&self, session_id: &str) -> Result<Option<SessionData>, AppError>;

    /// Remove a session. Returns whether it existed.
    async fn destroy(&self, session_id: &str) -> Result<bool, AppError>;
}
