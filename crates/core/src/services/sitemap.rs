//! Sitemap generation.
//!
//! Builds the `/sitemap.xml` document: a handful of static entries plus
//! one per approved ad. The rendered XML is held in a short-lived
//! in-process cache; the lock is never held across an await (the database
//! read happens first, the lock only guards the swap).

use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use afrikmarket_common::AppResult;
use afrikmarket_db::repositories::AdRepository;

/// How long a rendered sitemap stays fresh.
const CACHE_TTL: Duration = Duration::from_secs(600);

/// Static pages listed ahead of the ads.
const STATIC_ENTRIES: [(&str, &str, &str); 6] = [
    ("/", "daily", "1.0"),
    ("/ads", "daily", "0.9"),
    ("/blog", "weekly", "0.7"),
    ("/about", "monthly", "0.5"),
    ("/auth/register", "monthly", "0.5"),
    ("/auth/login", "monthly", "0.5"),
];

struct CachedSitemap {
    built_at: Instant,
    xml: String,
}

/// Sitemap service with an in-process cache.
#[derive(Clone)]
pub struct SitemapService {
    ad_repo: AdRepository,
    base_url: String,
    cache: Arc<RwLock<Option<CachedSitemap>>>,
}

impl SitemapService {
    /// Create a new sitemap service.
    #[must_use]
    pub fn new(ad_repo: AdRepository, base_url: String) -> Self {
        Self {
            ad_repo,
            base_url: base_url.trim_end_matches('/').to_string(),
            cache: Arc::new(RwLock::new(None)),
        }
    }

    /// The sitemap XML, rebuilt at most once per cache TTL.
    pub async fn xml(&self) -> AppResult<String> {
        if let Ok(guard) = self.cache.read()
            && let Some(cached) = guard.as_ref()
            && cached.built_at.elapsed() < CACHE_TTL
        {
            return Ok(cached.xml.clone());
        }

        let xml = self.build().await?;

        if let Ok(mut guard) = self.cache.write() {
            *guard = Some(CachedSitemap {
                built_at: Instant::now(),
                xml: xml.clone(),
            });
        }

        Ok(xml)
    }

    async fn build(&self) -> AppResult<String> {
        let ads = self.ad_repo.find_all_approved().await?;

        let mut xml = String::with_capacity(512 + ads.len() * 192);
        xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        xml.push_str("<urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n");

        for (path, changefreq, priority) in STATIC_ENTRIES {
            xml.push_str("  <url>\n");
            xml.push_str(&format!("    <loc>{}{}</loc>\n", self.base_url, path));
            xml.push_str(&format!("    <changefreq>{changefreq}</changefreq>\n"));
            xml.push_str(&format!("    <priority>{priority}</priority>\n"));
            xml.push_str("  </url>\n");
        }

        for ad in &ads {
            let lastmod = ad.updated_at.unwrap_or(ad.created_at).to_rfc3339();
            xml.push_str("  <url>\n");
            xml.push_str(&format!("    <loc>{}/ads/{}</loc>\n", self.base_url, ad.id));
            xml.push_str("    <changefreq>weekly</changefreq>\n");
            xml.push_str("    <priority>0.8</priority>\n");
            xml.push_str(&format!("    <lastmod>{lastmod}</lastmod>\n"));
            xml.push_str("  </url>\n");
        }

        xml.push_str("</urlset>\n");
        Ok(xml)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use afrikmarket_db::entities::ad::{self, AdStatus, Category};
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn create_test_ad(id: &str) -> ad::Model {
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
            status: AdStatus::Approved,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_sitemap_contains_static_and_ad_entries() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[create_test_ad("ad1"), create_test_ad("ad2")]])
            .into_connection();

        let service = SitemapService::new(
            AdRepository::new(std::sync::Arc::new(db)),
            "https://market.example.com/".to_string(),
        );

        let xml = service.xml().await.unwrap();

        assert!(xml.starts_with("<?xml"));
        assert_eq!(xml.matches("<url>").count(), STATIC_ENTRIES.len() + 2);
        assert!(xml.contains("<loc>https://market.example.com/</loc>"));
        assert!(xml.contains("<loc>https://market.example.com/ads/ad1</loc>"));
        assert!(xml.contains("<lastmod>"));
    }

    #[tokio::test]
    async fn test_sitemap_is_cached_within_ttl() {
        // Only one query result: the second call must come from the cache.
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[create_test_ad("ad1")]])
            .into_connection();

        let service = SitemapService::new(
            AdRepository::new(std::sync::Arc::new(db)),
            "https://market.example.com".to_string(),
        );

        let first = service.xml().await.unwrap();
        let second = service.xml().await.unwrap();
        assert_eq!(first, second);
    }
}
