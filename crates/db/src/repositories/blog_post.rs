//! Blog post repository.

use std::sync::Arc;

use crate::entities::{BlogPost, blog_post};
use afrikmarket_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, DatabaseConnection, EntityTrait, ModelTrait, PaginatorTrait, QueryOrder,
};

/// Blog post repository for database operations.
#[derive(Clone)]
pub struct BlogPostRepository {
    db: Arc<DatabaseConnection>,
}

impl BlogPostRepository {
    /// Create a new blog post repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a post by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<blog_post::Model>> {
        BlogPost::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a post by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<blog_post::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Blog post".to_string()))
    }

    /// Get all posts, newest first.
    pub async fn find_all(&self) -> AppResult<Vec<blog_post::Model>> {
        BlogPost::find()
            .order_by_desc(blog_post::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new post.
    pub async fn create(&self, model: blog_post::ActiveModel) -> AppResult<blog_post::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a post.
    pub async fn update(&self, model: blog_post::ActiveModel) -> AppResult<blog_post::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a post.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        let post = self.get_by_id(id).await?;
        post.delete(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Count all posts.
    pub async fn count(&self) -> AppResult<u64> {
        BlogPost::find()
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn create_test_post(id: &str) -> blog_post::Model {
        blog_post::Model {
            id: id.to_string(),
            title: "Bien vendre sur le marché".to_string(),
            content: "Quelques conseils...".to_string(),
            image_url: None,
            image_key: None,
            author_id: "admin1".to_string(),
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_get_by_id_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<blog_post::Model>::new()])
                .into_connection(),
        );

        let repo = BlogPostRepository::new(db);
        let result = repo.get_by_id("missing").await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_find_all() {
        let p1 = create_test_post("p1");
        let p2 = create_test_post("p2");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[p1, p2]])
                .into_connection(),
        );

        let repo = BlogPostRepository::new(db);
        let posts = repo.find_all().await.unwrap();
        assert_eq!(posts.len(), 2);
    }
}
