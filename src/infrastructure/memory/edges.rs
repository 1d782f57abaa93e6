use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::{Edge, EdgeKind, EdgeRepository, EdgeState, TargetKind};
use crate::infrastructure::repositories::EdgeTable;
use crate::shared::error::AppError;

use super::{EdgeRecord, MemoryDatabase, Tables};

/// In-memory [`EdgeRepository`] for any edge type. Every mutation runs under
/// the table write lock, which makes `toggle` atomic.
pub struct MemoryEdgeRepository<E: Edge> {
    db: Arc<MemoryDatabase>,
    _edge: PhantomData<fn() -> E>,
}

impl<E: Edge> MemoryEdgeRepository<E> {
    /// A repository over its own private edge table. Having no users or
    /// tweets of its own, it does not check foreign keys.
    pub fn new() -> Self {
        Self::shared(MemoryDatabase::detached())
    }

    /// A repository over tables shared with other in-memory repositories.
    pub fn shared(db: Arc<MemoryDatabase>) -> Self {
        Self {
            db,
            _edge: PhantomData,
        }
    }

    fn record(edge: &E) -> EdgeRecord {
        EdgeRecord {
            id: edge.id(),
            actor_id: edge.actor_id(),
            target_id: edge.target_id(),
            created_at: edge.created_at(),
        }
    }

    fn into_edge(record: &EdgeRecord) -> E {
        E::from_parts(record.id, record.actor_id, record.target_id, record.created_at)
    }

    /// Mirrors the unique `(actor, target)` index, the self-follow check and
    /// both foreign keys.
    fn check(tables: &Tables, record: &EdgeRecord) -> Result<(), AppError> {
        let table = EdgeTable::for_kind(E::KIND);

        tables.check_reference(table.table, table.actor, TargetKind::User, record.actor_id)?;
        tables.check_reference(table.table, table.target, E::KIND.target(), record.target_id)?;

        if E::KIND == EdgeKind::Follow && record.actor_id == record.target_id {
            return Err(AppError::ConstraintViolation {
                constraint: "follows_no_self_follow".into(),
            });
        }

        let duplicate = tables.edges(E::KIND).any(|e| {
            e.id != record.id && e.actor_id == record.actor_id && e.target_id == record.target_id
        });
        if duplicate {
            return Err(AppError::ConstraintViolation {
                constraint: format!("{}_{}_{}_key", table.table, table.actor, table.target),
            });
        }
        Ok(())
    }

    fn not_found(id: i64) -> AppError {
        AppError::NotFound(format!("{} with id {} not found", E::KIND, id))
    }
}

impl<E: Edge> Default for MemoryEdgeRepository<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<E: Edge> EdgeRepository<E> for MemoryEdgeRepository<E> {
    async fn find_by_id(&self, id: i64) -> Result<Option<E>, AppError> {
        let tables = self.db.tables.read();
        let found = tables
            .edges(E::KIND)
            .find(|e| e.id == id)
            .map(Self::into_edge);
        Ok(found)
    }

    async fn list(&self, limit: i64) -> Result<Vec<E>, AppError> {
        let tables = self.db.tables.read();
        let mut records: Vec<&EdgeRecord> = tables.edges(E::KIND).collect();
        records.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(records
            .into_iter()
            .take(limit.max(0) as usize)
            .map(Self::into_edge)
            .collect())
    }

    async fn exists(&self, actor_id: i64, target_id: i64) -> Result<bool, AppError> {
        let tables = self.db.tables.read();
        let exists = tables
            .edges(E::KIND)
            .any(|e| e.actor_id == actor_id && e.target_id == target_id);
        Ok(exists)
    }

    async fn create(&self, edge: &E) -> Result<E, AppError> {
        let record = Self::record(edge);
        let mut tables = self.db.tables.write();

        if tables.edges(E::KIND).any(|e| e.id == record.id) {
            return Err(AppError::ConstraintViolation {
                constraint: format!("{}_pkey", EdgeTable::for_kind(E::KIND).table),
            });
        }
        Self::check(&tables, &record)?;

        tables.edges_mut(E::KIND).insert(record.id, record);
        Ok(edge.clone())
    }

    async fn update(&self, edge: &E) -> Result<E, AppError> {
        let mut tables = self.db.tables.write();

        let existing = *tables
            .edges_mut(E::KIND)
            .get(&edge.id())
            .ok_or_else(|| Self::not_found(edge.id()))?;

        let record = EdgeRecord {
            created_at: existing.created_at,
            ..Self::record(edge)
        };
        Self::check(&tables, &record)?;

        tables.edges_mut(E::KIND).insert(record.id, record);
        Ok(Self::into_edge(&record))
    }

    async fn delete(&self, id: i64) -> Result<(), AppError> {
        match self.db.tables.write().edges_mut(E::KIND).remove(&id) {
            Some(_) => Ok(()),
            None => Err(Self::not_found(id)),
        }
    }

    async fn toggle(&self, edge: &E) -> Result<EdgeState, AppError> {
        let record = Self::record(edge);
        let mut tables = self.db.tables.write();

        let existing = tables
            .edges(E::KIND)
            .find(|e| e.actor_id == record.actor_id && e.target_id == record.target_id)
            .map(|e| e.id);

        match existing {
            Some(id) => {
                tables.edges_mut(E::KIND).remove(&id);
                Ok(EdgeState::Absent)
            }
            None => {
                Self::check(&tables, &record)?;
                tables.edges_mut(E::KIND).insert(record.id, record);
                Ok(EdgeState::Present)
            }
        }
    }

    async fn remove(&self, actor_id: i64, target_id: i64) -> Result<bool, AppError> {
        let mut table = self.db.tables.write();
        let edges = table.edges_mut(E::KIND);
        let before = edges.len();
        edges.retain(|_, e| !(e.actor_id == actor_id && e.target_id == target_id));
        Ok(edges.len() < before)
    }

    async fn count_by_target(&self, target_id: i64) -> Result<i64, AppError> {
        let tables = self.db.tables.read();
        Ok(tables
            .edges(E::KIND)
            .filter(|e| e.target_id == target_id)
            .count() as i64)
    }

    async fn count_by_actor(&self, actor_id: i64) -> Result<i64, AppError> {
        let tables = self.db.tables.read();
        Ok(tables
            .edges(E::KIND)
            .filter(|e| e.actor_id == actor_id)
            .count() as i64)
    }
}
