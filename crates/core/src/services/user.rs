//! User service.

use std::sync::Arc;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use afrikmarket_common::{
    storage::validate_image_upload, AppError, AppResult, IdGenerator, StorageBackend,
    generate_storage_key,
};
use afrikmarket_db::{
    entities::user::{self, UserRole},
    repositories::{AdRepository, SessionRepository, UserRepository},
};
use sea_orm::Set;
use serde::Deserialize;
use validator::Validate;

use crate::services::ad::ImageUpload;

/// User service for registration, authentication and account management.
#[derive(Clone)]
pub struct UserService {
    user_repo: UserRepository,
    ad_repo: AdRepository,
    session_repo: SessionRepository,
    storage: Arc<dyn StorageBackend>,
    id_gen: IdGenerator,
}

/// Input for registering a new user.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterInput {
    #[validate(length(min = 1, max = 128))]
    pub username: String,

    #[validate(email)]
    pub email: String,

    #[validate(length(min = 8, max = 128))]
    pub password: String,
}

/// Input for updating a user's own profile.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileInput {
    #[validate(length(min = 1, max = 128))]
    pub username: String,

    #[validate(email)]
    pub email: String,
}

impl UserService {
    /// Create a new user service.
    #[must_use]
    pub fn new(
        user_repo: UserRepository,
        ad_repo: AdRepository,
        session_repo: SessionRepository,
        storage: Arc<dyn StorageBackend>,
    ) -> Self {
        Self {
            user_repo,
            ad_repo,
            session_repo,
            storage,
            id_gen: IdGenerator::new(),
        }
    }

    /// Register a new user with the default role and a generated avatar.
    pub async fn register(&self, input: RegisterInput) -> AppResult<user::Model> {
        input.validate()?;

        // Duplicate username or email is a single generic conflict
        if self
            .user_repo
            .find_by_username_or_email(&input.username, &input.email)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(
                "L'e-mail ou le nom d'utilisateur existe déjà.".to_string(),
            ));
        }

        let password_hash = hash_password(&input.password)?;
        let avatar_url = default_avatar_url(&input.username);

        let model = user::ActiveModel {
            id: Set(self.id_gen.generate()),
            username: Set(input.username.clone()),
            username_lower: Set(input.username.to_lowercase()),
            email: Set(input.email.to_lowercase()),
            password_hash: Set(password_hash),
            role: Set(UserRole::User),
            avatar_url: Set(Some(avatar_url)),
            avatar_key: Set(None),
            created_at: Set(chrono::Utc::now().into()),
            updated_at: Set(None),
        };

        self.user_repo.create(model).await
    }

    /// Authenticate a user by email and password.
    ///
    /// Unknown email and wrong password take the same path so the caller
    /// cannot distinguish them.
    pub async fn authenticate(&self, email: &str, password: &str) -> AppResult<user::Model> {
        let user = self
            .user_repo
            .find_by_email(email)
            .await?
            .ok_or(AppError::Unauthorized)?;

        if !verify_password(password, &user.password_hash)? {
            return Err(AppError::Unauthorized);
        }

        Ok(user)
    }

    /// Get a user by ID.
    pub async fn get(&self, id: &str) -> AppResult<user::Model> {
        self.user_repo.get_by_id(id).await
    }

    /// Update a user's own profile; optionally replace the avatar.
    pub async fn update_profile(
        &self,
        user_id: &str,
        input: UpdateProfileInput,
        avatar: Option<ImageUpload>,
    ) -> AppResult<user::Model> {
        input.validate()?;

        let user = self.user_repo.get_by_id(user_id).await?;

        // Username/email must stay unique across other accounts
        if let Some(existing) = self
            .user_repo
            .find_by_username_or_email(&input.username, &input.email)
            .await?
            && existing.id != user.id
        {
            return Err(AppError::Conflict(
                "L'e-mail ou le nom d'utilisateur existe déjà.".to_string(),
            ));
        }

        let old_avatar_key = user.avatar_key.clone();
        let mut active: user::ActiveModel = user.into();
        active.username = Set(input.username.clone());
        active.username_lower = Set(input.username.to_lowercase());
        active.email = Set(input.email.to_lowercase());

        if let Some(avatar) = avatar {
            validate_image_upload(&avatar.data, &avatar.content_type)?;

            let key = generate_storage_key(user_id, &avatar.filename);
            let stored = self
                .storage
                .upload(&key, &avatar.data, &avatar.content_type)
                .await?;

            if let Some(old_key) = old_avatar_key
                && let Err(e) = self.storage.delete(&old_key).await
            {
                tracing::warn!(error = %e, key = %old_key, "Failed to delete previous avatar");
            }

            active.avatar_url = Set(Some(stored.url));
            active.avatar_key = Set(Some(stored.key));
        }

        active.updated_at = Set(Some(chrono::Utc::now().into()));

        self.user_repo.update(active).await
    }

    /// List users for the admin screen, newest first.
    ///
    /// `page` is one-based; returns `(users, total_items, total_pages)`.
    pub async fn list(
        &self,
        page: u64,
        per_page: u64,
    ) -> AppResult<(Vec<user::Model>, u64, u64)> {
        self.user_repo
            .find_paginated(page.saturating_sub(1), per_page)
            .await
    }

    /// Promote a user to admin.
    pub async fn promote(&self, actor: &user::Model, user_id: &str) -> AppResult<user::Model> {
        self.set_role(actor, user_id, UserRole::Admin).await
    }

    /// Demote an admin back to a regular user.
    pub async fn demote(&self, actor: &user::Model, user_id: &str) -> AppResult<user::Model> {
        self.set_role(actor, user_id, UserRole::User).await
    }

    async fn set_role(
        &self,
        actor: &user::Model,
        user_id: &str,
        role: UserRole,
    ) -> AppResult<user::Model> {
        if !actor.is_admin() {
            return Err(AppError::Forbidden(
                "Only admins can change roles".to_string(),
            ));
        }

        if actor.id == user_id {
            return Err(AppError::BadRequest(
                "Vous ne pouvez pas modifier votre propre rôle.".to_string(),
            ));
        }

        let user = self.user_repo.get_by_id(user_id).await?;
        let mut active: user::ActiveModel = user.into();
        active.role = Set(role);
        active.updated_at = Set(Some(chrono::Utc::now().into()));

        self.user_repo.update(active).await
    }

    /// Delete a user together with their ads and stored images.
    pub async fn delete(&self, actor: &user::Model, user_id: &str) -> AppResult<()> {
        if !actor.is_admin() {
            return Err(AppError::Forbidden(
                "Only admins can delete users".to_string(),
            ));
        }

        if actor.id == user_id {
            return Err(AppError::BadRequest(
                "Vous ne pouvez pas supprimer votre propre compte.".to_string(),
            ));
        }

        let user = self.user_repo.get_by_id(user_id).await?;

        // Images first; the rows cascade with the user
        for ad in self.ad_repo.find_by_author(&user.id).await? {
            for key in ad.image_key_list() {
                if let Err(e) = self.storage.delete(&key).await {
                    tracing::warn!(error = %e, key = %key, "Failed to delete ad image");
                }
            }
        }

        if let Some(avatar_key) = &user.avatar_key
            && let Err(e) = self.storage.delete(avatar_key).await
        {
            tracing::warn!(error = %e, key = %avatar_key, "Failed to delete avatar");
        }

        self.session_repo.delete_for_user(&user.id).await?;
        self.user_repo.delete(&user.id).await
    }
}

/// Default adventurer-style avatar, seeded by the username.
fn default_avatar_url(username: &str) -> String {
    format!(
        "https://api.dicebear.com/8.x/adventurer/svg?seed={}",
        urlencoding::encode(username)
    )
}

/// Hash a password using Argon2.
fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {e}")))
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| AppError::Internal(format!("Invalid hash: {e}")))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use afrikmarket_common::LocalStorage;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::path::PathBuf;

    fn create_test_user(id: &str, username: &str, role: UserRole) -> user::Model {
        user::Model {
            id: id.to_string(),
            username: username.to_string(),
            username_lower: username.to_lowercase(),
            email: format!("{}@example.com", username.to_lowercase()),
            password_hash: hash_password("password123").unwrap(),
            role,
            avatar_url: None,
            avatar_key: None,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn test_storage() -> Arc<dyn StorageBackend> {
        Arc::new(LocalStorage::new(
            PathBuf::from("/tmp/market-test-uploads"),
            "/uploads".to_string(),
        ))
    }

    fn service_with(db: sea_orm::DatabaseConnection) -> UserService {
        let db = Arc::new(db);
        UserService::new(
            UserRepository::new(Arc::clone(&db)),
            AdRepository::new(Arc::clone(&db)),
            SessionRepository::new(Arc::clone(&db)),
            test_storage(),
        )
    }

    // Unit tests for password functions
    #[test]
    fn test_hash_password() {
        let hash = hash_password("test_password_123").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(hash.len() > 50);
    }

    #[test]
    fn test_verify_password_correct() {
        let hash = hash_password("test_password_123").unwrap();
        assert!(verify_password("test_password_123", &hash).unwrap());
    }

    #[test]
    fn test_verify_password_incorrect() {
        let hash = hash_password("test_password_123").unwrap();
        assert!(!verify_password("wrong_password", &hash).unwrap());
    }

    #[test]
    fn test_hash_password_different_each_time() {
        let hash1 = hash_password("same_password").unwrap();
        let hash2 = hash_password("same_password").unwrap();

        // Different salts should produce different hashes
        assert_ne!(hash1, hash2);

        // But both should verify correctly
        assert!(verify_password("same_password", &hash1).unwrap());
        assert!(verify_password("same_password", &hash2).unwrap());
    }

    #[test]
    fn test_no_cross_user_collision() {
        let alice = hash_password("password123").unwrap();
        let bob = hash_password("password123").unwrap();
        assert!(!verify_password("password456", &alice).unwrap());
        assert!(verify_password("password123", &bob).unwrap());
    }

    #[test]
    fn test_default_avatar_url_is_seeded_and_encoded() {
        let url = default_avatar_url("marie claire");
        assert!(url.contains("seed=marie%20claire"));
    }

    #[test]
    fn test_register_input_validation() {
        let input = RegisterInput {
            username: "alice".to_string(),
            email: "not-an-email".to_string(),
            password: "password123".to_string(),
        };
        assert!(input.validate().is_err());

        let input = RegisterInput {
            username: "alice".to_string(),
            email: "alice@x.com".to_string(),
            password: "short".to_string(),
        };
        assert!(input.validate().is_err());

        let input = RegisterInput {
            username: "alice".to_string(),
            email: "alice@x.com".to_string(),
            password: "password123".to_string(),
        };
        assert!(input.validate().is_ok());
    }

    #[tokio::test]
    async fn test_register_duplicate_is_conflict() {
        let existing = create_test_user("user1", "alice", UserRole::User);
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[existing]])
            .into_connection();

        let service = service_with(db);
        let result = service
            .register(RegisterInput {
                username: "alice".to_string(),
                email: "alice@x.com".to_string(),
                password: "password123".to_string(),
            })
            .await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_authenticate_unknown_email_is_generic() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<user::Model>::new()])
            .into_connection();

        let service = service_with(db);
        let result = service.authenticate("nobody@x.com", "password123").await;

        assert!(matches!(result, Err(AppError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_authenticate_wrong_password_is_generic() {
        let user = create_test_user("user1", "alice", UserRole::User);
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[user]])
            .into_connection();

        let service = service_with(db);
        let result = service.authenticate("alice@example.com", "wrong-password").await;

        // Same error as the unknown-email case
        assert!(matches!(result, Err(AppError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_authenticate_correct_password() {
        let user = create_test_user("user1", "alice", UserRole::User);
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[user]])
            .into_connection();

        let service = service_with(db);
        let result = service
            .authenticate("alice@example.com", "password123")
            .await
            .unwrap();

        assert_eq!(result.id, "user1");
    }

    #[tokio::test]
    async fn test_promote_requires_admin() {
        let actor = create_test_user("user1", "alice", UserRole::User);
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();

        let service = service_with(db);
        let result = service.promote(&actor, "user2").await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_admin_cannot_change_own_role() {
        let actor = create_test_user("admin1", "boss", UserRole::Admin);
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();

        let service = service_with(db);
        let result = service.demote(&actor, "admin1").await;

        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_admin_cannot_delete_self() {
        let actor = create_test_user("admin1", "boss", UserRole::Admin);
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();

        let service = service_with(db);
        let result = service.delete(&actor, "admin1").await;

        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }
}
