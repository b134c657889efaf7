//! Testimonial service.

use afrikmarket_common::{AppResult, IdGenerator};
use afrikmarket_db::{entities::testimonial, repositories::TestimonialRepository};
use sea_orm::Set;
use serde::Deserialize;
use validator::Validate;

/// Input for submitting a testimonial.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTestimonialInput {
    #[validate(length(min = 1, max = 128, message = "Le nom est requis."))]
    pub name: String,

    #[validate(length(min = 1, message = "Le message est requis."))]
    pub message: String,

    #[validate(range(min = 1, max = 5, message = "La note doit être entre 1 et 5."))]
    pub rating: i16,
}

/// Testimonial service: public submission and home-page listing.
#[derive(Clone)]
pub struct TestimonialService {
    testimonial_repo: TestimonialRepository,
    id_gen: IdGenerator,
}

impl TestimonialService {
    /// Create a new testimonial service.
    #[must_use]
    pub const fn new(testimonial_repo: TestimonialRepository) -> Self {
        Self {
            testimonial_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Most recent testimonials for the home page.
    pub async fn recent(&self, limit: u64) -> AppResult<Vec<testimonial::Model>> {
        self.testimonial_repo.find_recent(limit).await
    }

    /// Submit a testimonial.
    pub async fn create(&self, input: CreateTestimonialInput) -> AppResult<testimonial::Model> {
        input.validate()?;

        let model = testimonial::ActiveModel {
            id: Set(self.id_gen.generate()),
            name: Set(input.name),
            message: Set(input.message),
            rating: Set(input.rating),
            created_at: Set(chrono::Utc::now().into()),
        };

        self.testimonial_repo.create(model).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rating_bounds() {
        let base = |rating| CreateTestimonialInput {
            name: "Awa".to_string(),
            message: "Super site !".to_string(),
            rating,
        };

        assert!(base(0).validate().is_err());
        assert!(base(6).validate().is_err());
        assert!(base(1).validate().is_ok());
        assert!(base(5).validate().is_ok());
    }
}
