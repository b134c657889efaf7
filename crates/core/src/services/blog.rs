//! Blog service.

use std::sync::Arc;

use afrikmarket_common::{
    storage::validate_image_upload, AppError, AppResult, IdGenerator, StorageBackend,
    generate_storage_key,
};
use afrikmarket_db::{
    entities::{blog_post, user},
    repositories::BlogPostRepository,
};
use sea_orm::Set;
use serde::Deserialize;
use validator::Validate;

use crate::services::ad::ImageUpload;

/// Input for creating a blog post.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateBlogPostInput {
    #[validate(length(min = 1, max = 256, message = "Le titre est requis."))]
    pub title: String,

    #[validate(length(min = 1, message = "Le contenu est requis."))]
    pub content: String,
}

/// Input for updating a blog post.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateBlogPostInput {
    #[validate(length(min = 1, max = 256, message = "Le titre est requis."))]
    pub title: String,

    #[validate(length(min = 1, message = "Le contenu est requis."))]
    pub content: String,
}

/// Blog service: public reads, admin-only writes.
#[derive(Clone)]
pub struct BlogService {
    blog_repo: BlogPostRepository,
    storage: Arc<dyn StorageBackend>,
    id_gen: IdGenerator,
}

impl BlogService {
    /// Create a new blog service.
    #[must_use]
    pub fn new(blog_repo: BlogPostRepository, storage: Arc<dyn StorageBackend>) -> Self {
        Self {
            blog_repo,
            storage,
            id_gen: IdGenerator::new(),
        }
    }

    /// All posts, newest first.
    pub async fn list(&self) -> AppResult<Vec<blog_post::Model>> {
        self.blog_repo.find_all().await
    }

    /// A single post.
    pub async fn get(&self, id: &str) -> AppResult<blog_post::Model> {
        self.blog_repo.get_by_id(id).await
    }

    /// Create a post; admin-authored only.
    pub async fn create(
        &self,
        author: &user::Model,
        input: CreateBlogPostInput,
        cover: Option<ImageUpload>,
    ) -> AppResult<blog_post::Model> {
        if !author.is_admin() {
            return Err(AppError::Forbidden(
                "Only admins can write blog posts".to_string(),
            ));
        }

        input.validate()?;

        let (image_url, image_key) = match cover {
            Some(image) => {
                let stored = self.upload_cover(&author.id, &image).await?;
                (Some(stored.0), Some(stored.1))
            }
            None => (None, None),
        };

        let model = blog_post::ActiveModel {
            id: Set(self.id_gen.generate()),
            title: Set(input.title),
            content: Set(input.content),
            image_url: Set(image_url),
            image_key: Set(image_key),
            author_id: Set(author.id.clone()),
            created_at: Set(chrono::Utc::now().into()),
            updated_at: Set(None),
        };

        self.blog_repo.create(model).await
    }

    /// Update a post; admin-only. A new cover replaces (and deletes) the old.
    pub async fn update(
        &self,
        id: &str,
        actor: &user::Model,
        input: UpdateBlogPostInput,
        cover: Option<ImageUpload>,
    ) -> AppResult<blog_post::Model> {
        if !actor.is_admin() {
            return Err(AppError::Forbidden(
                "Only admins can edit blog posts".to_string(),
            ));
        }

        input.validate()?;

        let post = self.blog_repo.get_by_id(id).await?;
        let old_key = post.image_key.clone();

        let mut active: blog_post::ActiveModel = post.into();
        active.title = Set(input.title);
        active.content = Set(input.content);

        if let Some(image) = cover {
            let (url, key) = self.upload_cover(&actor.id, &image).await?;

            if let Some(old_key) = old_key
                && let Err(e) = self.storage.delete(&old_key).await
            {
                tracing::warn!(error = %e, key = %old_key, "Failed to delete replaced cover image");
            }

            active.image_url = Set(Some(url));
            active.image_key = Set(Some(key));
        }

        active.updated_at = Set(Some(chrono::Utc::now().into()));

        self.blog_repo.update(active).await
    }

    /// Delete a post; admin-only.
    pub async fn delete(&self, id: &str, actor: &user::Model) -> AppResult<()> {
        if !actor.is_admin() {
            return Err(AppError::Forbidden(
                "Only admins can delete blog posts".to_string(),
            ));
        }

        let post = self.blog_repo.get_by_id(id).await?;

        if let Some(key) = &post.image_key
            && let Err(e) = self.storage.delete(key).await
        {
            tracing::warn!(error = %e, key = %key, "Failed to delete cover image");
        }

        self.blog_repo.delete(id).await
    }

    async fn upload_cover(
        &self,
        owner_id: &str,
        image: &ImageUpload,
    ) -> AppResult<(String, String)> {
        validate_image_upload(&image.data, &image.content_type)?;

        let key = generate_storage_key(owner_id, &image.filename);
        let stored = self
            .storage
            .upload(&key, &image.data, &image.content_type)
            .await?;

        Ok((stored.url, stored.key))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use afrikmarket_common::LocalStorage;
    use afrikmarket_db::entities::user::UserRole;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::path::PathBuf;

    fn create_test_user(id: &str, role: UserRole) -> user::Model {
        user::Model {
            id: id.to_string(),
            username: "admin".to_string(),
            username_lower: "admin".to_string(),
            email: "admin@example.com".to_string(),
            password_hash: "$argon2id$test".to_string(),
            role,
            avatar_url: None,
            avatar_key: None,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn service_with(db: sea_orm::DatabaseConnection) -> BlogService {
        BlogService::new(
            BlogPostRepository::new(std::sync::Arc::new(db)),
            Arc::new(LocalStorage::new(
                PathBuf::from("/tmp/market-test-uploads"),
                "/uploads".to_string(),
            )),
        )
    }

    #[tokio::test]
    async fn test_create_requires_admin() {
        let author = create_test_user("user1", UserRole::User);
        let service = service_with(
            MockDatabase::new(DatabaseBackend::Postgres).into_connection(),
        );

        let input = CreateBlogPostInput {
            title: "Titre".to_string(),
            content: "Contenu".to_string(),
        };

        let result = service.create(&author, input, None).await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_create_validates_input() {
        let author = create_test_user("admin1", UserRole::Admin);
        let service = service_with(
            MockDatabase::new(DatabaseBackend::Postgres).into_connection(),
        );

        let input = CreateBlogPostInput {
            title: String::new(),
            content: "Contenu".to_string(),
        };

        let result = service.create(&author, input, None).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}
