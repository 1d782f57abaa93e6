use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::{Comment, CommentRepository, TargetKind};
use crate::shared::error::AppError;

use super::MemoryDatabase;

/// In-memory [`CommentRepository`].
#[derive(Clone)]
pub struct MemoryCommentRepository {
    db: Arc<MemoryDatabase>,
}

impl MemoryCommentRepository {
    pub fn new(db: Arc<MemoryDatabase>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CommentRepository for MemoryCommentRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<Comment>, AppError> {
        Ok(self.db.tables.read().comments.get(&id).cloned())
    }

    async fn list(&self, limit: i64) -> Result<Vec<Comment>, AppError> {
        let tables = self.db.tables.read();
        let mut comments: Vec<Comment> = tables.comments.values().cloned().collect();
        comments.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        comments.truncate(limit.max(0) as usize);
        Ok(comments)
    }

    async fn find_by_tweet(&self, tweet_id: i64) -> Result<Vec<Comment>, AppError> {
        let tables = self.db.tables.read();
        let mut comments: Vec<Comment> = tables
            .comments
            .values()
            .filter(|c| c.tweet_id == tweet_id)
            .cloned()
            .collect();
        comments.sort_by(|a, b| (a.created_at, a.id).cmp(&(b.created_at, b.id)));
        Ok(comments)
    }

    async fn create(&self, comment: &Comment) -> Result<Comment, AppError> {
        let mut tables = self.db.tables.write();
        if tables.comments.contains_key(&comment.id) {
            return Err(AppError::ConstraintViolation {
                constraint: "comments_pkey".into(),
            });
        }
        tables.check_reference("comments", "tweet_id", TargetKind::Tweet, comment.tweet_id)?;
        tables.check_reference("comments", "user_id", TargetKind::User, comment.user_id)?;
        tables.comments.insert(comment.id, comment.clone());
        Ok(comment.clone())
    }

    async fn update(&self, comment: &Comment) -> Result<Comment, AppError> {
        let mut tables = self.db.tables.write();
        let stored = tables.comments.get_mut(&comment.id).ok_or_else(|| {
            AppError::NotFound(format!("Comment with id {} not found", comment.id))
        })?;

        stored.content = comment.content.clone();
        Ok(stored.clone())
    }

    async fn delete(&self, id: i64) -> Result<(), AppError> {
        match self.db.tables.write().comments.remove(&id) {
            Some(_) => Ok(()),
            None => Err(AppError::NotFound(format!("Comment with id {} not found", id))),
        }
    }
}
