//! Retweet entity.
//!
//! Maps to the `retweets` table in the database schema.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::edge::{Edge, EdgeKind};

/// A user re-sharing someone's tweet.
///
/// Maps to the `retweets` table:
/// - id: BIGINT PRIMARY KEY (Snowflake ID)
/// - user_id: BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE
/// - tweet_id: BIGINT NOT NULL REFERENCES tweets(id) ON DELETE CASCADE
/// - created_at: TIMESTAMPTZ NOT NULL DEFAULT NOW()
///
/// UNIQUE (user_id, tweet_id).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Retweet {
    pub id: i64,
    pub user_id: i64,
    pub tweet_id: i64,
    pub created_at: DateTime<Utc>,
}

impl Edge for Retweet {
    const KIND: EdgeKind = EdgeKind::Retweet;

    fn id(&self) -> i64 {
        self.id
    }

    fn actor_id(&self) -> i64 {
        self.user_id
    }

    fn target_id(&self) -> i64 {
        self.tweet_id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn from_parts(id: i64, actor_id: i64, target_id: i64, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            user_id: actor_id,
            tweet_id: target_id,
            created_at,
        }
    }
}
