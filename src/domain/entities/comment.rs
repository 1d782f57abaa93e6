//! Comment entity and repository trait.
//!
//! Maps to the `comments` table in the database schema.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::error::AppError;

/// A reply attached to a tweet.
///
/// Maps to the `comments` table:
/// - id: BIGINT PRIMARY KEY (Snowflake ID)
/// - tweet_id: BIGINT NOT NULL REFERENCES tweets(id) ON DELETE CASCADE
/// - user_id: BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE
/// - content: VARCHAR(280) NOT NULL
/// - created_at: TIMESTAMPTZ NOT NULL DEFAULT NOW()
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub tweet_id: i64,
    pub user_id: i64,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl Comment {
    pub fn new(id: i64, tweet_id: i64, user_id: i64, content: String) -> Self {
        Self {
            id,
            tweet_id,
            user_id,
            content,
            created_at: Utc::now(),
        }
    }
}

/// Repository trait for Comment data access operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CommentRepository: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<Comment>, AppError>;

    /// Most recent comments across all tweets.
    async fn list(&self, limit: i64) -> Result<Vec<Comment>, AppError>;

    /// Comments on one tweet, oldest first.
    async fn find_by_tweet(&self, tweet_id: i64) -> Result<Vec<Comment>, AppError>;

    async fn create(&self, comment: &Comment) -> Result<Comment, AppError>;

    async fn update(&self, comment: &Comment) -> Result<Comment, AppError>;

    async fn delete(&self, id: i64) -> Result<(), AppError>;
}
