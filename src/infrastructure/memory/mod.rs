//! In-Memory Repositories
//!
//! Process-local implementations of every repository trait, selected with
//! `database.backend = "memory"`. They mirror the PostgreSQL schema's
//! constraints (unique usernames, emails and edge pairs, no self-follow,
//! foreign keys, cascading deletes) so that services behave the same on
//! either backend.
//!
//! All repositories created from one [`MemoryDatabase`] share its tables.

mod comments;
mod edges;
mod tweets;
mod users;

pub use comments::MemoryCommentRepository;
pub use edges::MemoryEdgeRepository;
pub use tweets::MemoryTweetRepository;
pub use users::MemoryUserRepository;

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use crate::domain::{Comment, EdgeKind, TargetKind, Tweet, User};
use crate::shared::error::AppError;

/// Stored form of a follow, like or retweet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct EdgeRecord {
    pub id: i64,
    pub actor_id: i64,
    pub target_id: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub(crate) struct Tables {
    pub users: BTreeMap<i64, User>,
    pub tweets: BTreeMap<i64, Tweet>,
    pub comments: BTreeMap<i64, Comment>,
    pub edges: HashMap<EdgeKind, BTreeMap<i64, EdgeRecord>>,
    /// Off only for detached tables that have no parent rows.
    enforce_references: bool,
}

impl Tables {
    /// FOREIGN KEY check: `table.column` must point at a stored user or tweet.
    pub fn check_reference(
        &self,
        table: &str,
        column: &str,
        parent: TargetKind,
        id: i64,
    ) -> Result<(), AppError> {
        if !self.enforce_references {
            return Ok(());
        }

        let found = match parent {
            TargetKind::User => self.users.contains_key(&id),
            TargetKind::Tweet => self.tweets.contains_key(&id),
        };
        if found {
            Ok(())
        } else {
            Err(AppError::MissingReference {
                constraint: format!("{}_{}_fkey", table, column),
            })
        }
    }

    pub fn edges(&self, kind: EdgeKind) -> impl Iterator<Item = &EdgeRecord> {
        self.edges.get(&kind).into_iter().flat_map(|m| m.values())
    }

    pub fn edges_mut(&mut self, kind: EdgeKind) -> &mut BTreeMap<i64, EdgeRecord> {
        self.edges.entry(kind).or_default()
    }

    pub fn follows(&self, follower_id: i64, followed_id: i64) -> bool {
        self.edges(EdgeKind::Follow)
            .any(|e| e.actor_id == follower_id && e.target_id == followed_id)
    }

    /// ON DELETE CASCADE for a tweet.
    pub fn delete_tweet(&mut self, tweet_id: i64) -> bool {
        if self.tweets.remove(&tweet_id).is_none() {
            return false;
        }
        self.comments.retain(|_, c| c.tweet_id != tweet_id);
        for kind in [EdgeKind::Like, EdgeKind::Retweet] {
            self.edges_mut(kind).retain(|_, e| e.target_id != tweet_id);
        }
        true
    }

    /// ON DELETE CASCADE for a user.
    pub fn delete_user(&mut self, user_id: i64) -> bool {
        if self.users.remove(&user_id).is_none() {
            return false;
        }
        let owned: Vec<i64> = self
            .tweets
            .values()
            .filter(|t| t.user_id == user_id)
            .map(|t| t.id)
            .collect();
        for tweet_id in owned {
            self.delete_tweet(tweet_id);
        }
        self.comments.retain(|_, c| c.user_id != user_id);
        for kind in [EdgeKind::Like, EdgeKind::Retweet] {
            self.edges_mut(kind).retain(|_, e| e.actor_id != user_id);
        }
        self.edges_mut(EdgeKind::Follow)
            .retain(|_, e| e.actor_id != user_id && e.target_id != user_id);
        true
    }
}

/// Shared tables behind the in-memory repositories.
#[derive(Debug)]
pub struct MemoryDatabase {
    pub(crate) tables: RwLock<Tables>,
}

impl MemoryDatabase {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            tables: RwLock::new(Tables {
                enforce_references: true,
                ..Tables::default()
            }),
        })
    }

    /// Tables for a repository used on its own, with no users or tweets to
    /// reference. Foreign keys are not checked.
    pub(crate) fn detached() -> Arc<Self> {
        Arc::new(Self {
            tables: RwLock::new(Tables::default()),
        })
    }
}
