//! Session service.
//!
//! Server-side session state behind the signed session cookie. Tokens are
//! opaque UUIDs; expiry is enforced on lookup, not by a background sweep.

use afrikmarket_common::{AppError, AppResult, IdGenerator};
use afrikmarket_db::{
    entities::{session, user},
    repositories::{SessionRepository, UserRepository},
};
use sea_orm::Set;

/// Session service for login state.
#[derive(Clone)]
pub struct SessionService {
    session_repo: SessionRepository,
    user_repo: UserRepository,
    ttl_seconds: i64,
    id_gen: IdGenerator,
}

impl SessionService {
    /// Create a new session service.
    #[must_use]
    pub const fn new(
        session_repo: SessionRepository,
        user_repo: UserRepository,
        ttl_seconds: i64,
    ) -> Self {
        Self {
            session_repo,
            user_repo,
            ttl_seconds,
            id_gen: IdGenerator::new(),
        }
    }

    /// Open a new session for a user and return its token row.
    pub async fn create(&self, user_id: &str) -> AppResult<session::Model> {
        let now = chrono::Utc::now();
        let model = session::ActiveModel {
            id: Set(self.id_gen.generate_token()),
            user_id: Set(user_id.to_string()),
            expires_at: Set((now + chrono::Duration::seconds(self.ttl_seconds)).into()),
            created_at: Set(now.into()),
        };

        self.session_repo.create(model).await
    }

    /// Resolve a session token to its user.
    ///
    /// Expired sessions behave exactly like missing ones; the stale row is
    /// removed on the way out.
    pub async fn authenticate(&self, token: &str) -> AppResult<user::Model> {
        let session = self
            .session_repo
            .find_by_id(token)
            .await?
            .ok_or(AppError::Unauthorized)?;

        if session.is_expired() {
            if let Err(e) = self.session_repo.delete(&session.id).await {
                tracing::warn!(error = %e, "Failed to remove expired session");
            }
            return Err(AppError::Unauthorized);
        }

        self.user_repo.get_by_id(&session.user_id).await
    }

    /// Destroy a session (logout).
    pub async fn destroy(&self, token: &str) -> AppResult<()> {
        self.session_repo.delete(token).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use afrikmarket_db::entities::user::UserRole;
    use chrono::{Duration, Utc};
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use std::sync::Arc;

    fn create_test_user(id: &str) -> user::Model {
        user::Model {
            id: id.to_string(),
            username: "alice".to_string(),
            username_lower: "alice".to_string(),
            email: "alice@example.com".to_string(),
            password_hash: "$argon2id$test".to_string(),
            role: UserRole::User,
            avatar_url: None,
            avatar_key: None,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn create_test_session(token: &str, expired: bool) -> session::Model {
        let offset = if expired {
            -Duration::hours(1)
        } else {
            Duration::hours(1)
        };
        session::Model {
            id: token.to_string(),
            user_id: "user1".to_string(),
            expires_at: (Utc::now() + offset).into(),
            created_at: Utc::now().into(),
        }
    }

    fn service_with(db: sea_orm::DatabaseConnection) -> SessionService {
        let db = Arc::new(db);
        SessionService::new(
            SessionRepository::new(Arc::clone(&db)),
            UserRepository::new(Arc::clone(&db)),
            60 * 60 * 24,
        )
    }

    #[tokio::test]
    async fn test_authenticate_valid_session() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[create_test_session("tok1", false)]])
            .append_query_results([[create_test_user("user1")]])
            .into_connection();

        let service = service_with(db);
        let user = service.authenticate("tok1").await.unwrap();
        assert_eq!(user.id, "user1");
    }

    #[tokio::test]
    async fn test_authenticate_unknown_token() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<session::Model>::new()])
            .into_connection();

        let service = service_with(db);
        let result = service.authenticate("missing").await;
        assert!(matches!(result, Err(AppError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_authenticate_expired_session() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[create_test_session("tok1", true)]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection();

        let service = service_with(db);
        let result = service.authenticate("tok1").await;
        assert!(matches!(result, Err(AppError::Unauthorized)));
    }
}
