//! Social edges: the shared shape of follows, likes and retweets.
//!
//! Every edge links an *actor* (the user who performed the action) to a
//! *target* (a user for follows, a tweet for likes and retweets). At most
//! one edge may exist per `(actor, target)` pair, and an edge only ever
//! moves between two states:
//!
//! ```text
//! Absent --toggle--> Present --toggle--> Absent --> ...
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::shared::error::AppError;

/// Which relationship an edge represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeKind {
    Follow,
    Like,
    Retweet,
}

/// What an edge points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    User,
    Tweet,
}

impl EdgeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Follow => "follow",
            Self::Like => "like",
            Self::Retweet => "retweet",
        }
    }

    pub fn target(&self) -> TargetKind {
        match self {
            Self::Follow => TargetKind::User,
            Self::Like | Self::Retweet => TargetKind::Tweet,
        }
    }
}

impl std::fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Resulting state of an `(actor, target)` pair after a mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeState {
    Present,
    Absent,
}

impl EdgeState {
    pub fn is_present(&self) -> bool {
        matches!(self, Self::Present)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Present => "present",
            Self::Absent => "absent",
        }
    }
}

/// Common accessors for every social edge entity.
pub trait Edge: Clone + Send + Sync + 'static {
    const KIND: EdgeKind;

    fn id(&self) -> i64;
    fn actor_id(&self) -> i64;
    fn target_id(&self) -> i64;
    fn created_at(&self) -> DateTime<Utc>;

    /// Rebuild an edge from its stored columns.
    fn from_parts(id: i64, actor_id: i64, target_id: i64, created_at: DateTime<Utc>) -> Self;

    /// A fresh edge stamped with the current time.
    fn new(id: i64, actor_id: i64, target_id: i64) -> Self {
        Self::from_parts(id, actor_id, target_id, Utc::now())
    }

    /// Reject pairs that must never be stored.
    fn check_pair(_actor_id: i64, _target_id: i64) -> Result<(), &'static str> {
        Ok(())
    }
}

/// Repository trait shared by all edge tables.
///
/// Implementations must back `(actor, target)` with a unique index so that
/// [`EdgeRepository::toggle`] and [`EdgeRepository::create`] can never
/// produce duplicate rows, even under concurrent requests.
#[async_trait]
pub trait EdgeRepository<E: Edge>: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<E>, AppError>;

    /// Most recent edges first.
    async fn list(&self, limit: i64) -> Result<Vec<E>, AppError>;

    /// Whether `actor` currently has an edge to `target`.
    async fn exists(&self, actor_id: i64, target_id: i64) -> Result<bool, AppError>;

    /// Insert an edge; a duplicate pair fails with
    /// [`AppError::ConstraintViolation`].
    async fn create(&self, edge: &E) -> Result<E, AppError>;

    /// Replace the actor/target of an existing edge.
    async fn update(&self, edge: &E) -> Result<E, AppError>;

    async fn delete(&self, id: i64) -> Result<(), AppError>;

    /// Atomically delete the `(actor, target)` edge if present, otherwise
    /// insert `edge`. Returns the state after the call. Two concurrent
    /// first toggles of the same pair both report `Present`: one inserts,
    /// the other finds the pair already stored.
    async fn toggle(&self, edge: &E) -> Result<EdgeState, AppError>;

    /// Delete the `(actor, target)` edge if present. Returns whether a row
    /// was removed.
    async fn remove(&self, actor_id: i64, target_id: i64) -> Result<bool, AppError>;

    /// Number of edges pointing at `target`.
    async fn count_by_target(&self, target_id: i64) -> Result<i64, AppError>;

    /// Number of edges created by `actor`.
    async fn count_by_actor(&self, actor_id: i64) -> Result<i64, AppError>;
}
