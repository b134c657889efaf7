//! Moderation workflow for ads.
//!
//! A small state machine per ad: `pending → approved` and
//! `pending → rejected`, both admin-triggered and one-way. Owner edits
//! demote the ad back to `pending` (handled by the ad service).

use crate::services::notification::NotificationService;
use afrikmarket_common::{AppError, AppResult};
use afrikmarket_db::{
    entities::ad::{self, AdStatus},
    repositories::AdRepository,
};
use sea_orm::Set;

/// Moderation service for approving and rejecting ads.
#[derive(Clone)]
pub struct ModerationService {
    ad_repo: AdRepository,
    notification_service: NotificationService,
}

impl ModerationService {
    /// Create a new moderation service.
    #[must_use]
    pub const fn new(ad_repo: AdRepository, notification_service: NotificationService) -> Self {
        Self {
            ad_repo,
            notification_service,
        }
    }

    /// Approve a pending ad and notify its author with a direct link.
    pub async fn approve(&self, ad_id: &str) -> AppResult<ad::Model> {
        let ad = self.transition(ad_id, AdStatus::Approved).await?;

        let message = format!("Votre annonce \"{}\" a été approuvée.", ad.title);
        let link = format!("/ads/{}", ad.id);
        self.notify_best_effort(&ad.author_id, &message, Some(&link))
            .await;

        Ok(ad)
    }

    /// Reject a pending ad and notify its author. No link: the ad is not
    /// publicly reachable.
    pub async fn reject(&self, ad_id: &str) -> AppResult<ad::Model> {
        let ad = self.transition(ad_id, AdStatus::Rejected).await?;

        let message = format!("Votre annonce \"{}\" a été rejetée.", ad.title);
        self.notify_best_effort(&ad.author_id, &message, None).await;

        Ok(ad)
    }

    /// Apply a one-way transition out of `pending`.
    ///
    /// Moderating an ad that already left `pending` is a conflict; no
    /// duplicate notification is ever written for it.
    async fn transition(&self, ad_id: &str, to: AdStatus) -> AppResult<ad::Model> {
        let ad = self.ad_repo.get_by_id(ad_id).await?;

        if ad.status != AdStatus::Pending {
            return Err(AppError::Conflict(
                "Cette annonce a déjà été modérée.".to_string(),
            ));
        }

        let mut active: ad::ActiveModel = ad.into();
        active.status = Set(to);
        active.updated_at = Set(Some(chrono::Utc::now().into()));

        self.ad_repo.update(active).await
    }

    /// The status change is already committed; a failed notification write
    /// is logged and swallowed.
    async fn notify_best_effort(&self, user_id: &str, message: &str, link: Option<&str>) {
        if let Err(e) = self.notification_service.notify(user_id, message, link).await {
            tracing::warn!(error = %e, user_id = %user_id, "Failed to write moderation notification");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use afrikmarket_db::entities::ad::Category;
    use afrikmarket_db::entities::notification;
    use afrikmarket_db::repositories::NotificationRepository;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use std::sync::Arc;

    fn create_test_ad(id: &str, status: AdStatus) -> ad::Model {
        ad::Model {
            id: id.to_string(),
            title: "Bike".to_string(),
            description: "A bike".to_string(),
            price: 50,
            category: Category::Loisirs,
            location: None,
            phone: None,
            image_urls: serde_json::json!([]),
            image_keys: serde_json::json!([]),
            affiliate_link: None,
            author_id: "user1".to_string(),
            status,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn create_test_notification(id: &str, link: Option<&str>) -> notification::Model {
        notification::Model {
            id: id.to_string(),
            user_id: "user1".to_string(),
            message: "Votre annonce \"Bike\" a été approuvée.".to_string(),
            link: link.map(ToString::to_string),
            is_read: false,
            created_at: Utc::now().into(),
        }
    }

    fn service_with(db: sea_orm::DatabaseConnection) -> ModerationService {
        let db = Arc::new(db);
        ModerationService::new(
            AdRepository::new(Arc::clone(&db)),
            NotificationService::new(NotificationRepository::new(db)),
        )
    }

    #[tokio::test]
    async fn test_approve_pending_ad() {
        let pending = create_test_ad("ad1", AdStatus::Pending);
        let approved = create_test_ad("ad1", AdStatus::Approved);

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            // fetch, update returning, notification insert returning
            .append_query_results([[pending]])
            .append_query_results([[approved]])
            .append_query_results([[create_test_notification("n1", Some("/ads/ad1"))]])
            .append_exec_results([
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                },
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                },
            ])
            .into_connection();

        let service = service_with(db);
        let result = service.approve("ad1").await.unwrap();

        assert_eq!(result.status, AdStatus::Approved);
    }

    #[tokio::test]
    async fn test_approve_already_approved_is_conflict() {
        let approved = create_test_ad("ad1", AdStatus::Approved);

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[approved]])
            .into_connection();

        let service = service_with(db);
        let result = service.approve("ad1").await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_reject_already_rejected_is_conflict() {
        let rejected = create_test_ad("ad1", AdStatus::Rejected);

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[rejected]])
            .into_connection();

        let service = service_with(db);
        let result = service.reject("ad1").await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_approve_missing_ad_is_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<ad::Model>::new()])
            .into_connection();

        let service = service_with(db);
        let result = service.approve("missing").await;

        assert!(matches!(result, Err(AppError::AdNotFound(_))));
    }

    #[tokio::test]
    async fn test_notification_failure_does_not_roll_back_approval() {
        let pending = create_test_ad("ad1", AdStatus::Pending);
        let approved = create_test_ad("ad1", AdStatus::Approved);

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[pending]])
            .append_query_results([[approved]])
            // notification insert blows up
            .append_query_errors([sea_orm::DbErr::Custom("connection lost".to_string())])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection();

        let service = service_with(db);
        let result = service.approve("ad1").await.unwrap();

        // Best-effort notify: the approval stands
        assert_eq!(result.status, AdStatus::Approved);
    }
}
