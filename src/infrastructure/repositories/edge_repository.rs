//! Edge Repository Implementation
//!
//! One generic PostgreSQL repository serves the `follows`, `likes` and
//! `retweets` tables. Each table has the same shape (id, actor column,
//! target column, created_at) and a UNIQUE index on `(actor, target)`.

use std::marker::PhantomData;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::{Edge, EdgeKind, EdgeRepository, EdgeState};
use crate::shared::error::AppError;

/// Physical layout of an edge table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeTable {
    pub table: &'static str,
    pub actor: &'static str,
    pub target: &'static str,
}

impl EdgeTable {
    pub const fn for_kind(kind: EdgeKind) -> Self {
        match kind {
            EdgeKind::Follow => Self {
                table: "follows",
                actor: "follower_id",
                target: "followed_id",
            },
            EdgeKind::Like => Self {
                table: "likes",
                actor: "user_id",
                target: "tweet_id",
            },
            EdgeKind::Retweet => Self {
                table: "retweets",
                actor: "user_id",
                target: "tweet_id",
            },
        }
    }

    fn select(&self) -> String {
        format!(
            "SELECT id, {} AS actor_id, {} AS target_id, created_at FROM {}",
            self.actor, self.target, self.table
        )
    }

    fn returning(&self) -> String {
        format!(
            "RETURNING id, {} AS actor_id, {} AS target_id, created_at",
            self.actor, self.target
        )
    }

    /// Delete the pair if present, otherwise insert it, in one statement.
    /// Yields whether a row was removed and whether one was inserted.
    fn toggle_sql(&self) -> String {
        format!(
            r#"
            WITH removed AS (
                DELETE FROM {t} WHERE {a} = $2 AND {g} = $3
                RETURNING id
            ), inserted AS (
                INSERT INTO {t} (id, {a}, {g}, created_at)
                SELECT $1, $2, $3, $4
                WHERE NOT EXISTS (SELECT 1 FROM removed)
                ON CONFLICT ({a}, {g}) DO NOTHING
                RETURNING id
            )
            SELECT EXISTS (SELECT 1 FROM removed), EXISTS (SELECT 1 FROM inserted)
            "#,
            t = self.table,
            a = self.actor,
            g = self.target,
        )
    }
}

/// State left by one run of [`EdgeTable::toggle_sql`]. When nothing was
/// removed and the insert hit the unique pair, a concurrent toggle stored
/// the edge first and it is present.
fn toggle_outcome(removed: bool, inserted: bool) -> EdgeState {
    if removed && !inserted {
        EdgeState::Absent
    } else {
        EdgeState::Present
    }
}

#[derive(Debug, sqlx::FromRow)]
struct EdgeRow {
    id: i64,
    actor_id: i64,
    target_id: i64,
    created_at: DateTime<Utc>,
}

impl EdgeRow {
    fn into_edge<E: Edge>(self) -> E {
        E::from_parts(self.id, self.actor_id, self.target_id, self.created_at)
    }
}

/// PostgreSQL repository for any [`Edge`] type.
pub struct PgEdgeRepository<E: Edge> {
    pool: PgPool,
    table: EdgeTable,
    _edge: PhantomData<fn() -> E>,
}

impl<E: Edge> PgEdgeRepository<E> {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            table: EdgeTable::for_kind(E::KIND),
            _edge: PhantomData,
        }
    }

    fn not_found(&self, id: i64) -> AppError {
        AppError::NotFound(format!("{} with id {} not found", E::KIND, id))
    }
}

impl<E: Edge> Clone for PgEdgeRepository<E> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            table: self.table,
            _edge: PhantomData,
        }
    }
}

#[async_trait]
impl<E: Edge> EdgeRepository<E> for PgEdgeRepository<E> {
    async fn find_by_id(&self, id: i64) -> Result<Option<E>, AppError> {
        let sql = format!("{} WHERE id = $1", self.table.select());
        let row = sqlx::query_as::<_, EdgeRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(EdgeRow::into_edge))
    }

    async fn list(&self, limit: i64) -> Result<Vec<E>, AppError> {
        let sql = format!(
            "{} ORDER BY created_at DESC, id DESC LIMIT $1",
            self.table.select()
        );
        let rows = sqlx::query_as::<_, EdgeRow>(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(EdgeRow::into_edge).collect())
    }

    async fn exists(&self, actor_id: i64, target_id: i64) -> Result<bool, AppError> {
        let sql = format!(
            "SELECT EXISTS(SELECT 1 FROM {} WHERE {} = $1 AND {} = $2)",
            self.table.table, self.table.actor, self.table.target
        );
        let exists = sqlx::query_scalar::<_, bool>(&sql)
            .bind(actor_id)
            .bind(target_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(exists)
    }

    async fn create(&self, edge: &E) -> Result<E, AppError> {
        let sql = format!(
            "INSERT INTO {} (id, {}, {}, created_at) VALUES ($1, $2, $3, $4) {}",
            self.table.table,
            self.table.actor,
            self.table.target,
            self.table.returning()
        );
        let row = sqlx::query_as::<_, EdgeRow>(&sql)
            .bind(edge.id())
            .bind(edge.actor_id())
            .bind(edge.target_id())
            .bind(edge.created_at())
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::from_write)?;

        Ok(row.into_edge())
    }

    async fn update(&self, edge: &E) -> Result<E, AppError> {
        let sql = format!(
            "UPDATE {} SET {} = $2, {} = $3 WHERE id = $1 {}",
            self.table.table,
            self.table.actor,
            self.table.target,
            self.table.returning()
        );
        let row = sqlx::query_as::<_, EdgeRow>(&sql)
            .bind(edge.id())
            .bind(edge.actor_id())
            .bind(edge.target_id())
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::from_write)?
            .ok_or_else(|| self.not_found(edge.id()))?;

        Ok(row.into_edge())
    }

    async fn delete(&self, id: i64) -> Result<(), AppError> {
        let sql = format!("DELETE FROM {} WHERE id = $1", self.table.table);
        let result = sqlx::query(&sql).bind(id).execute(&self.pool).await?;

        if result.rows_affected() == 0 {
            return Err(self.not_found(id));
        }

        Ok(())
    }

    async fn toggle(&self, edge: &E) -> Result<EdgeState, AppError> {
        let (removed, inserted) = sqlx::query_as::<_, (bool, bool)>(&self.table.toggle_sql())
            .bind(edge.id())
            .bind(edge.actor_id())
            .bind(edge.target_id())
            .bind(edge.created_at())
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::from_write)?;

        Ok(toggle_outcome(removed, inserted))
    }

    async fn remove(&self, actor_id: i64, target_id: i64) -> Result<bool, AppError> {
        let sql = format!(
            "DELETE FROM {} WHERE {} = $1 AND {} = $2",
            self.table.table, self.table.actor, self.table.target
        );
        let result = sqlx::query(&sql)
            .bind(actor_id)
            .bind(target_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn count_by_target(&self, target_id: i64) -> Result<i64, AppError> {
        let sql = format!(
            "SELECT COUNT(*) FROM {} WHERE {} = $1",
            self.table.table, self.table.target
        );
        let count = sqlx::query_scalar::<_, i64>(&sql)
            .bind(target_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    async fn count_by_actor(&self, actor_id: i64) -> Result<i64, AppError> {
        let sql = format!(
            "SELECT COUNT(*) FROM {} WHERE {} = $1",
            self.table.table, self.table.actor
        );
        let count = sqlx::query_scalar::<_, i64>(&sql)
            .bind(actor_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tables_per_kind() {
        assert_eq!(EdgeTable::for_kind(EdgeKind::Follow).table, "follows");
        assert_eq!(EdgeTable::for_kind(EdgeKind::Follow).target, "followed_id");
        assert_eq!(EdgeTable::for_kind(EdgeKind::Like).table, "likes");
        assert_eq!(EdgeTable::for_kind(EdgeKind::Retweet).actor, "user_id");
    }

    #[test]
    fn test_toggle_sql_targets_unique_pair() {
        let sql = EdgeTable::for_kind(EdgeKind::Like).toggle_sql();

        assert!(sql.contains("DELETE FROM likes WHERE user_id = $2 AND tweet_id = $3"));
        assert!(sql.contains("ON CONFLICT (user_id, tweet_id) DO NOTHING"));
        assert!(sql.contains("WHERE NOT EXISTS (SELECT 1 FROM removed)"));
        assert!(sql.contains("SELECT EXISTS (SELECT 1 FROM removed), EXISTS (SELECT 1 FROM inserted)"));
    }

    #[test]
    fn test_toggle_lost_to_concurrent_insert_reads_present() {
        assert_eq!(toggle_outcome(true, false), EdgeState::Absent);
        assert_eq!(toggle_outcome(false, true), EdgeState::Present);
        assert_eq!(toggle_outcome(false, false), EdgeState::Present);
    }
}
