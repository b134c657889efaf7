//! Notification service.

use afrikmarket_common::{AppResult, IdGenerator};
use afrikmarket_db::{entities::notification, repositories::NotificationRepository};
use sea_orm::Set;

/// Notification service for per-user inboxes.
#[derive(Clone)]
pub struct NotificationService {
    notification_repo: NotificationRepository,
    id_gen: IdGenerator,
}

impl NotificationService {
    /// Create a new notification service.
    #[must_use]
    pub const fn new(notification_repo: NotificationRepository) -> Self {
        Self {
            notification_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Write a notification to a user's inbox.
    pub async fn notify(
        &self,
        user_id: &str,
        message: &str,
        link: Option<&str>,
    ) -> AppResult<notification::Model> {
        let model = notification::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_id: Set(user_id.to_string()),
            message: Set(message.to_string()),
            link: Set(link.map(ToString::to_string)),
            is_read: Set(false),
            created_at: Set(chrono::Utc::now().into()),
        };

        self.notification_repo.create(model).await
    }

    /// Get notifications for a user, newest first.
    pub async fn list_for_user(
        &self,
        user_id: &str,
        limit: u64,
    ) -> AppResult<Vec<notification::Model>> {
        self.notification_repo.find_by_user(user_id, limit).await
    }

    /// Count unread notifications for a user.
    pub async fn count_unread(&self, user_id: &str) -> AppResult<u64> {
        self.notification_repo.count_unread(user_id).await
    }

    /// Mark all of a user's notifications as read.
    pub async fn mark_all_read(&self, user_id: &str) -> AppResult<u64> {
        self.notification_repo.mark_all_as_read(user_id).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_notify_writes_unread_notification() {
        let expected = notification::Model {
            id: "n1".to_string(),
            user_id: "user1".to_string(),
            message: "Votre annonce \"Bike\" a été approuvée.".to_string(),
            link: Some("/ads/ad1".to_string()),
            is_read: false,
            created_at: Utc::now().into(),
        };

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[expected.clone()]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let service = NotificationService::new(NotificationRepository::new(db));
        let created = service
            .notify("user1", "Votre annonce \"Bike\" a été approuvée.", Some("/ads/ad1"))
            .await
            .unwrap();

        assert!(!created.is_read);
        assert_eq!(created.link.as_deref(), Some("/ads/ad1"));
    }
}
