//! Ad repository.

use std::sync::Arc;

use crate::entities::{Ad, ad, ad::AdStatus};
use afrikmarket_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect,
};

/// Ad repository for database operations.
#[derive(Clone)]
pub struct AdRepository {
    db: Arc<DatabaseConnection>,
}

impl AdRepository {
    /// Create a new ad repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find an ad by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<ad::Model>> {
        Ad::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find an ad by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<ad::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::AdNotFound(id.to_string()))
    }

    /// Create a new ad.
    pub async fn create(&self, model: ad::ActiveModel) -> AppResult<ad::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update an ad.
    pub async fn update(&self, model: ad::ActiveModel) -> AppResult<ad::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete an ad.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        let ad = self.get_by_id(id).await?;
        ad.delete(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Get ads newest-first, one page at a time, optionally filtered by
    /// status. Returns `(items, total_items, total_pages)`; total pages
    /// is `ceil(total_items / per_page)`.
    ///
    /// `page` is zero-based.
    pub async fn find_paginated(
        &self,
        status: Option<AdStatus>,
        page: u64,
        per_page: u64,
    ) -> AppResult<(Vec<ad::Model>, u64, u64)> {
        let mut query = Ad::find().order_by_desc(ad::Column::CreatedAt);

        if let Some(status) = status {
            query = query.filter(ad::Column::Status.eq(status));
        }

        let paginator = query.paginate(self.db.as_ref(), per_page);

        let totals = paginator
            .num_items_and_pages()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let ads = paginator
            .fetch_page(page)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok((ads, totals.number_of_items, totals.number_of_pages))
    }

    /// Get the most recent approved ads.
    pub async fn find_recent_approved(&self, limit: u64) -> AppResult<Vec<ad::Model>> {
        Ad::find()
            .filter(ad::Column::Status.eq(AdStatus::Approved))
            .order_by_desc(ad::Column::CreatedAt)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get all ads by an author, newest first.
    pub async fn find_by_author(&self, author_id: &str) -> AppResult<Vec<ad::Model>> {
        Ad::find()
            .filter(ad::Column::AuthorId.eq(author_id))
            .order_by_desc(ad::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get an author's approved ads, newest first (public profile view).
    pub async fn find_approved_by_author(&self, author_id: &str) -> AppResult<Vec<ad::Model>> {
        Ad::find()
            .filter(ad::Column::AuthorId.eq(author_id))
            .filter(ad::Column::Status.eq(AdStatus::Approved))
            .order_by_desc(ad::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get every approved ad, newest first (sitemap generation).
    pub async fn find_all_approved(&self) -> AppResult<Vec<ad::Model>> {
        Ad::find()
            .filter(ad::Column::Status.eq(AdStatus::Approved))
            .order_by_desc(ad::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count all ads.
    pub async fn count(&self) -> AppResult<u64> {
        Ad::find()
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count ads with the given status.
    pub async fn count_by_status(&self, status: AdStatus) -> AppResult<u64> {
        Ad::find()
            .filter(ad::Column::Status.eq(status))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count ads grouped by status. Returns `(status label, count)` pairs.
    pub async fn count_grouped_by_status(&self) -> AppResult<Vec<(String, i64)>> {
        Ad::find()
            .select_only()
            .column(ad::Column::Status)
            .column_as(ad::Column::Id.count(), "count")
            .group_by(ad::Column::Status)
            .into_tuple::<(String, i64)>()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete all ads by an author. Returns the number of rows removed.
    pub async fn delete_by_author(&self, author_id: &str) -> AppResult<u64> {
        let result = Ad::delete_many()
            .filter(ad::Column::AuthorId.eq(author_id))
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
    use crate::entities::ad::Category;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn create_test_ad(id: &str, status: AdStatus) -> ad::Model {
        ad::Model {
            id: id.to_string(),
            title: "Vélo de course".to_string(),
            description: "Très bon état".to_string(),
            price: 50,
            category: Category::Loisirs,
            location: Some("Dakar".to_string()),
            phone: None,
            image_urls: serde_json::json!(["https://img.example.com/a.jpg"]),
            image_keys: serde_json::json!(["2025/01/01/a"]),
            affiliate_link: None,
            author_id: "user1".to_string(),
            status,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_find_by_id_found() {
        let ad = create_test_ad("ad1", AdStatus::Pending);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[ad.clone()]])
                .into_connection(),
        );

        let repo = AdRepository::new(db);
        let result = repo.find_by_id("ad1").await.unwrap();

        assert!(result.is_some());
        assert_eq!(result.unwrap().title, "Vélo de course");
    }

    #[tokio::test]
    async fn test_get_by_id_not_found_returns_error() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<ad::Model>::new()])
                .into_connection(),
        );

        let repo = AdRepository::new(db);
        let result = repo.get_by_id("missing").await;

        match result {
            Err(AppError::AdNotFound(id)) => assert_eq!(id, "missing"),
            _ => panic!("Expected AdNotFound error"),
        }
    }

    #[tokio::test]
    async fn test_find_recent_approved() {
        let ad1 = create_test_ad("ad1", AdStatus::Approved);
        let ad2 = create_test_ad("ad2", AdStatus::Approved);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[ad1, ad2]])
                .into_connection(),
        );

        let repo = AdRepository::new(db);
        let result = repo.find_recent_approved(4).await.unwrap();

        assert_eq!(result.len(), 2);
        assert!(result.iter().all(|a| a.status == AdStatus::Approved));
    }

    #[tokio::test]
    async fn test_image_lists_decode_from_json() {
        let ad = create_test_ad("ad1", AdStatus::Pending);
        assert_eq!(ad.image_url_list(), vec!["https://img.example.com/a.jpg"]);
        assert_eq!(ad.image_key_list(), vec!["2025/01/01/a"]);
    }
}
