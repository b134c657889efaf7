//! Session repository.

use std::sync::Arc;

use crate::entities::{Session, session};
use afrikmarket_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
};

/// Session repository for database operations.
#[derive(Clone)]
pub struct SessionRepository {
    db: Arc<DatabaseConnection>,
}

impl SessionRepository {
    /// Create a new session repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a session by its token.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<session::Model>> {
        Session::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new session.
    pub async fn create(&self, model: session::ActiveModel) -> AppResult<session::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a session by its token.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        Session::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Delete all sessions for a user (logout everywhere / user removal).
    pub async fn delete_for_user(&self, user_id: &str) -> AppResult<u64> {
        let result = Session::delete_many()
            .filter(session::Column::UserId.eq(user_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }

    /// Delete expired sessions. Returns the number of rows removed.
    pub async fn delete_expired(&self) -> AppResult<u64> {
        let result = Session::delete_many()
            .filter(session::Column::ExpiresAt.lt(chrono::Utc::now()))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn create_test_session(id: &str, expired: bool) -> session::Model {
        let offset = if expired {
            -Duration::hours(1)
        } else {
            Duration::hours(1)
        };
        session::Model {
            id: id.to_string(),
            user_id: "user1".to_string(),
            expires_at: (Utc::now() + offset).into(),
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_find_by_id() {
        let session = create_test_session("tok1", false);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[session.clone()]])
                .into_connection(),
        );

        let repo = SessionRepository::new(db);
        let result = repo.find_by_id("tok1").await.unwrap();

        assert!(result.is_some());
        assert_eq!(result.unwrap().user_id, "user1");
    }

    #[test]
    fn test_expiry_check() {
        assert!(create_test_session("a", true).is_expired());
        assert!(!create_test_session("b", false).is_expired());
    }
}
