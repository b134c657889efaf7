//! Admin dashboard statistics.

use afrikmarket_common::AppResult;
use afrikmarket_db::{
    entities::ad::AdStatus,
    repositories::{AdRepository, BlogPostRepository, UserRepository},
};
use serde::Serialize;

/// Registrations in one month.
#[derive(Debug, Clone, Serialize)]
pub struct MonthlyCount {
    /// `YYYY-MM`
    pub month: String,
    pub count: i64,
}

/// Ads carrying one status.
#[derive(Debug, Clone, Serialize)]
pub struct StatusCount {
    pub status: String,
    pub count: i64,
}

/// Everything the dashboard charts need.
#[derive(Debug, Serialize)]
pub struct DashboardStats {
    pub total_ads: u64,
    pub pending_ads: u64,
    pub total_users: u64,
    pub total_blog_posts: u64,
    pub users_by_month: Vec<MonthlyCount>,
    pub ads_by_status: Vec<StatusCount>,
}

/// Stats service backing the admin dashboard.
#[derive(Clone)]
pub struct StatsService {
    ad_repo: AdRepository,
    user_repo: UserRepository,
    blog_repo: BlogPostRepository,
}

impl StatsService {
    /// Create a new stats service.
    #[must_use]
    pub const fn new(
        ad_repo: AdRepository,
        user_repo: UserRepository,
        blog_repo: BlogPostRepository,
    ) -> Self {
        Self {
            ad_repo,
            user_repo,
            blog_repo,
        }
    }

    /// Gather the dashboard numbers.
    pub async fn dashboard(&self) -> AppResult<DashboardStats> {
        let total_ads = self.ad_repo.count().await?;
        let pending_ads = self.ad_repo.count_by_status(AdStatus::Pending).await?;
        let total_users = self.user_repo.count().await?;
        let total_blog_posts = self.blog_repo.count().await?;

        let six_months_ago = chrono::Utc::now() - chrono::Duration::days(180);
        let users_by_month = self
            .user_repo
            .count_registrations_by_month(six_months_ago)
            .await?
            .into_iter()
            .map(|(month, count)| MonthlyCount { month, count })
            .collect();

        let ads_by_status = self
            .ad_repo
            .count_grouped_by_status()
            .await?
            .into_iter()
            .map(|(status, count)| StatusCount { status, count })
            .collect();

        Ok(DashboardStats {
            total_ads,
            pending_ads,
            total_users,
            total_blog_posts,
            users_by_month,
            ads_by_status,
        })
    }
}
