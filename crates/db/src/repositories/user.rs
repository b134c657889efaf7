//! User repository.

use std::sync::Arc;

use crate::entities::{User, user};
use afrikmarket_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, ModelTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, sea_query::Expr,
};

/// User repository for database operations.
#[derive(Clone)]
pub struct UserRepository {
    db: Arc<DatabaseConnection>,
}

impl UserRepository {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a user by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<user::Model>> {
        User::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a user by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<user::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::UserNotFound(id.to_string()))
    }

    /// Find a user by email (stored lowercase).
    pub async fn find_by_email(&self, email: &str) -> AppResult<Option<user::Model>> {
        User::find()
            .filter(user::Column::Email.eq(email.to_lowercase()))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a user matching either the username or the email.
    ///
    /// Used by registration to detect duplicates in one query.
    pub async fn find_by_username_or_email(
        &self,
        username: &str,
        email: &str,
    ) -> AppResult<Option<user::Model>> {
        User::find()
            .filter(
                Condition::any()
                    .add(user::Column::UsernameLower.eq(username.to_lowercase()))
                    .add(user::Column::Email.eq(email.to_lowercase())),
            )
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new user.
    pub async fn create(&self, model: user::ActiveModel) -> AppResult<user::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a user.
    pub async fn update(&self, model: user::ActiveModel) -> AppResult<user::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a user. Dependent rows (ads, sessions, notifications)
    /// go with it via foreign-key cascade.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        let user = self.get_by_id(id).await?;
        user.delete(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Get users newest-first, one page at a time, with total counts.
    pub async fn find_paginated(
        &self,
        page: u64,
        per_page: u64,
    ) -> AppResult<(Vec<user::Model>, u64, u64)> {
        let paginator = User::find()
            .order_by_desc(user::Column::CreatedAt)
            .paginate(self.db.as_ref(), per_page);

        let totals = paginator
            .num_items_and_pages()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let users = paginator
            .fetch_page(page)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok((users, totals.number_of_items, totals.number_of_pages))
    }

    /// Count all users.
    pub async fn count(&self) -> AppResult<u64> {
        User::find()
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count registrations grouped by month since the given instant.
    ///
    /// Returns `(YYYY-MM, count)` pairs in ascending month order.
    pub async fn count_registrations_by_month(
        &self,
        since: chrono::DateTime<chrono::Utc>,
    ) -> AppResult<Vec<(String, i64)>> {
        User::find()
            .select_only()
            .column_as(Expr::cust("to_char(created_at, 'YYYY-MM')"), "month")
            .column_as(user::Column::Id.count(), "count")
            .filter(user::Column::CreatedAt.gte(since))
            .group_by(Expr::cust("to_char(created_at, 'YYYY-MM')"))
            .order_by_asc(Expr::cust("to_char(created_at, 'YYYY-MM')"))
            .into_tuple::<(String, i64)>()
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
