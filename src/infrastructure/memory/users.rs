use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use crate::domain::{User, UserRepository};
use crate::shared::error::AppError;

use super::MemoryDatabase;

/// In-memory [`UserRepository`].
#[derive(Clone)]
pub struct MemoryUserRepository {
    db: Arc<MemoryDatabase>,
}

impl MemoryUserRepository {
    pub fn new(db: Arc<MemoryDatabase>) -> Self {
        Self { db }
    }
}

/// Mirrors the `users_username_key` / `users_email_key` unique indexes.
fn check_unique(existing: &User, candidate: &User) -> Result<(), AppError> {
    if existing.id == candidate.id {
        return Ok(());
    }
    if existing.username == candidate.username {
        return Err(AppError::ConstraintViolation {
            constraint: "users_username_key".into(),
        });
    }
    if existing.email == candidate.email {
        return Err(AppError::ConstraintViolation {
            constraint: "users_email_key".into(),
        });
    }
    Ok(())
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, AppError> {
        Ok(self.db.tables.read().users.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let tables = self.db.tables.read();
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let tables = self.db.tables.read();
        Ok(tables.users.values().find(|u| u.username == username).cloned())
    }

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<User>, AppError> {
        let tables = self.db.tables.read();
        Ok(tables
            .users
            .values()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn not_followed_by(&self, user_id: i64, limit: i64) -> Result<Vec<User>, AppError> {
        let tables = self.db.tables.read();
        Ok(tables
            .users
            .values()
            .rev()
            .filter(|u| u.id != user_id && !tables.follows(user_id, u.id))
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn create(&self, user: &User) -> Result<User, AppError> {
        let mut tables = self.db.tables.write();
        if tables.users.contains_key(&user.id) {
            return Err(AppError::ConstraintViolation {
                constraint: "users_pkey".into(),
            });
        }
        for existing in tables.users.values() {
            check_unique(existing, user)?;
        }
        tables.users.insert(user.id, user.clone());
        Ok(user.clone())
    }

    async fn update(&self, user: &User) -> Result<User, AppError> {
        let mut tables = self.db.tables.write();
        for existing in tables.users.values() {
            check_unique(existing, user)?;
        }
        let stored = tables
            .users
            .get_mut(&user.id)
            .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", user.id)))?;

        stored.username = user.username.clone();
        stored.email = user.email.clone();
        stored.bio = user.bio.clone();
        stored.profile_picture = user.profile_picture.clone();
        stored.role = user.role.clone();
        stored.updated_at = Utc::now();
        Ok(stored.clone())
    }

    async fn delete(&self, id: i64) -> Result<(), AppError> {
        if self.db.tables.write().delete_user(id) {
            Ok(())
        } else {
            Err(AppError::NotFound(format!("User with id {} not found", id)))
        }
    }

    async fn email_exists(&self, email: &str) -> Result<bool, AppError> {
        Ok(self.db.tables.read().users.values().any(|u| u.email == email))
    }

    async fn username_exists(&self, username: &str) -> Result<bool, AppError> {
        Ok(self
            .db
            .tables
            .read()
            .users
            .values()
            .any(|u| u.username == username))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Edge, EdgeRepository, Follow};
    use crate::infrastructure::memory::MemoryEdgeRepository;

    fn user(id: i64, username: &str) -> User {
        User {
            id,
            username: username.into(),
            email: format!("{}@example.com", username),
            ..User::default()
        }
    }

    #[tokio::test]
    async fn test_duplicate_username_is_constraint_violation() {
        let repo = MemoryUserRepository::new(MemoryDatabase::new());
        repo.create(&user(1, "alice")).await.unwrap();

        let mut dup = user(2, "alice");
        dup.email = "other@example.com".into();

        match repo.create(&dup).await {
            Err(AppError::ConstraintViolation { constraint }) => {
                assert_eq!(constraint, "users_username_key")
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_duplicate_email_is_constraint_violation() {
        let repo = MemoryUserRepository::new(MemoryDatabase::new());
        repo.create(&user(1, "alice")).await.unwrap();

        let mut dup = user(2, "bob");
        dup.email = "alice@example.com".into();

        match repo.create(&dup).await {
            Err(AppError::ConstraintViolation { constraint }) => {
                assert_eq!(constraint, "users_email_key")
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_not_followed_by_excludes_self_and_followed() {
        let db = MemoryDatabase::new();
        let repo = MemoryUserRepository::new(db.clone());
        let follows = MemoryEdgeRepository::<Follow>::shared(db);
        for (id, name) in [(1, "a"), (2, "b"), (3, "c")] {
            repo.create(&user(id, name)).await.unwrap();
        }
        follows.create(&Follow::new(10, 1, 2)).await.unwrap();

        let suggestions = repo.not_followed_by(1, 10).await.unwrap();

        let ids: Vec<i64> = suggestions.iter().map(|u| u.id).collect();
        assert_eq!(ids, vec![3]);
    }

    #[tokio::test]
    async fn test_update_missing_user() {
        let repo = MemoryUserRepository::new(MemoryDatabase::new());
        assert!(matches!(
            repo.update(&user(9, "ghost")).await,
            Err(AppError::NotFound(_))
        ));
    }
}
