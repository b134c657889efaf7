//! Testimonial repository.

use std::sync::Arc;

use crate::entities::{Testimonial, testimonial};
use afrikmarket_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, DatabaseConnection, EntityTrait, QueryOrder, QuerySelect,
};

/// Testimonial repository for database operations.
#[derive(Clone)]
pub struct TestimonialRepository {
    db: Arc<DatabaseConnection>,
}

impl TestimonialRepository {
    /// Create a new testimonial repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Get the most recent testimonials.
    pub async fn find_recent(&self, limit: u64) -> AppResult<Vec<testimonial::Model>> {
        Testimonial::find()
            .order_by_desc(testimonial::Column::CreatedAt)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new testimonial.
    pub async fn create(&self, model: testimonial::ActiveModel) -> AppResult<testimonial::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
