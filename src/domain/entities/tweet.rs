//! Tweet entity and repository trait.
//!
//! Maps to the `tweets` table in the database schema.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::error::AppError;

/// Maximum tweet and comment length in characters.
pub const MAX_CONTENT_LENGTH: usize = 280;

/// A short post owned by a user.
///
/// Maps to the `tweets` table:
/// - id: BIGINT PRIMARY KEY (Snowflake ID)
/// - user_id: BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE
/// - content: VARCHAR(280) NOT NULL
/// - created_at: TIMESTAMPTZ NOT NULL DEFAULT NOW()
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tweet {
    pub id: i64,
    pub user_id: i64,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl Tweet {
    pub fn new(id: i64, user_id: i64, content: String) -> Self {
        Self {
            id,
            user_id,
            content,
            created_at: Utc::now(),
        }
    }
}

/// One tweet of a home feed with its author's name, engagement counts and
/// the reader's own like/retweet flags.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedEntry {
    pub tweet: Tweet,
    pub author: String,
    pub likes: i64,
    pub retweets: i64,
    pub comments: i64,
    pub liked_by_me: bool,
    pub retweeted_by_me: bool,
}

/// Shared content rule for tweets and comments: non-blank, at most
/// [`MAX_CONTENT_LENGTH`] characters.
pub fn check_content(content: &str) -> Result<(), &'static str> {
    if content.trim().is_empty() {
        return Err("Content is required.");
    }
    if content.chars().count() > MAX_CONTENT_LENGTH {
        return Err("Content must be at most 280 characters.");
    }
    Ok(())
}

/// Repository trait for Tweet data access operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TweetRepository: Send + Sync {
    /// Find a tweet by ID.
    async fn find_by_id(&self, id: i64) -> Result<Option<Tweet>, AppError>;

    /// Most recent tweets across all users.
    async fn list(&self, limit: i64) -> Result<Vec<Tweet>, AppError>;

    /// Most recent tweets authored by one user.
    async fn find_by_user(&self, user_id: i64, limit: i64) -> Result<Vec<Tweet>, AppError>;

    /// Most recent tweets authored by `user_id` or by anyone `user_id`
    /// follows, each decorated for `user_id` as the reader, in one round-trip.
    async fn feed_for(&self, user_id: i64, limit: i64) -> Result<Vec<FeedEntry>, AppError>;

    /// Number of tweets authored by a user.
    async fn count_by_user(&self, user_id: i64) -> Result<i64, AppError>;

    /// Insert a new tweet.
    async fn create(&self, tweet: &Tweet) -> Result<Tweet, AppError>;

    /// Replace the content of an existing tweet.
    async fn update(&self, tweet: &Tweet) -> Result<Tweet, AppError>;

    /// Delete a tweet by ID.
    async fn delete(&self, id: i64) -> Result<(), AppError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_rules() {
        assert!(check_content("hello").is_ok());
        assert!(check_content(&"a".repeat(MAX_CONTENT_LENGTH)).is_ok());
        assert_eq!(check_content("   "), Err("Content is required."));
        assert!(check_content(&"a".repeat(MAX_CONTENT_LENGTH + 1)).is_err());
    }

    #[test]
    fn test_content_counts_characters_not_bytes() {
        let emoji = "🐦".repeat(MAX_CONTENT_LENGTH);
        assert!(check_content(&emoji).is_ok());
    }
}
