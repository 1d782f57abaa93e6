//! Follow entity.
//!
//! Maps to the `follows` table in the database schema.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::edge::{Edge, EdgeKind};

/// A directed follow relationship between two users.
///
/// Maps to the `follows` table:
/// - id: BIGINT PRIMARY KEY (Snowflake ID)
/// - follower_id: BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE
/// - followed_id: BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE
/// - created_at: TIMESTAMPTZ NOT NULL DEFAULT NOW()
///
/// UNIQUE (follower_id, followed_id), CHECK (follower_id <> followed_id).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Follow {
    pub id: i64,
    pub follower_id: i64,
    pub followed_id: i64,
    pub created_at: DateTime<Utc>,
}

impl Edge for Follow {
    const KIND: EdgeKind = EdgeKind::Follow;

    fn id(&self) -> i64 {
        self.id
    }

    fn actor_id(&self) -> i64 {
        self.follower_id
    }

    fn target_id(&self) -> i64 {
        self.followed_id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn from_parts(id: i64, actor_id: i64, target_id: i64, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            follower_id: actor_id,
            followed_id: target_id,
            created_at,
        }
    }

    fn check_pair(actor_id: i64, target_id: i64) -> Result<(), &'static str> {
        if actor_id == target_id {
            return Err("You cannot follow yourself.");
        }
        Ok(())
    }
}
