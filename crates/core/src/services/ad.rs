//! Ad service — the listing store.

use std::sync::Arc;

use afrikmarket_common::{
    storage::{validate_image_upload, MAX_IMAGES_PER_LISTING},
    AppError, AppResult, IdGenerator, StorageBackend, StoredImage, generate_storage_key,
};
use afrikmarket_db::{
    entities::{
        ad::{self, AdStatus, Category},
        user,
    },
    repositories::AdRepository,
};
use sea_orm::Set;
use serde::Deserialize;
use validator::Validate;

/// An image payload received from a multipart form.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub filename: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

/// Input for creating an ad.
///
/// There is deliberately no status field: every new ad starts `pending`.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateAdInput {
    #[validate(length(min = 1, max = 256, message = "Le titre est requis."))]
    pub title: String,

    #[validate(length(min = 1, message = "La description est requise."))]
    pub description: String,

    #[validate(range(min = 1, message = "Le prix doit être une valeur positive."))]
    pub price: i64,

    pub category: String,

    #[validate(length(max = 256))]
    pub location: Option<String>,

    #[validate(length(max = 32))]
    pub phone: Option<String>,

    #[validate(url)]
    pub affiliate_link: Option<String>,
}

/// Input for updating an ad. Same shape as creation; images are separate.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateAdInput {
    #[validate(length(min = 1, max = 256, message = "Le titre est requis."))]
    pub title: String,

    #[validate(length(min = 1, message = "La description est requise."))]
    pub description: String,

    #[validate(range(min = 1, message = "Le prix doit être une valeur positive."))]
    pub price: i64,

    pub category: String,

    #[validate(length(max = 256))]
    pub location: Option<String>,

    #[validate(length(max = 32))]
    pub phone: Option<String>,

    #[validate(url)]
    pub affiliate_link: Option<String>,
}

/// One page of ads plus pagination totals.
#[derive(Debug)]
pub struct PaginatedAds {
    pub items: Vec<ad::Model>,
    pub page: u64,
    pub per_page: u64,
    pub total_items: u64,
    pub total_pages: u64,
}

/// An author's ads grouped by moderation status.
#[derive(Debug, Default)]
pub struct AuthorAds {
    pub approved: Vec<ad::Model>,
    pub pending: Vec<ad::Model>,
    pub rejected: Vec<ad::Model>,
}

/// Ad service for listing CRUD and visibility rules.
#[derive(Clone)]
pub struct AdService {
    ad_repo: AdRepository,
    storage: Arc<dyn StorageBackend>,
    id_gen: IdGenerator,
}

impl AdService {
    /// Create a new ad service.
    #[must_use]
    pub fn new(ad_repo: AdRepository, storage: Arc<dyn StorageBackend>) -> Self {
        Self {
            ad_repo,
            storage,
            id_gen: IdGenerator::new(),
        }
    }

    /// Create a new ad with status `pending`.
    ///
    /// All images are uploaded concurrently and joined before the single
    /// insert; one failed upload aborts the whole create.
    pub async fn create(
        &self,
        author: &user::Model,
        input: CreateAdInput,
        images: Vec<ImageUpload>,
    ) -> AppResult<ad::Model> {
        input.validate()?;
        let category = parse_category(&input.category)?;

        let stored = self.upload_images(&author.id, &images).await?;
        let (urls, keys) = split_stored(&stored);

        // The affiliate link is an admin-only field
        let affiliate_link = if author.is_admin() {
            input.affiliate_link
        } else {
            None
        };

        let model = ad::ActiveModel {
            id: Set(self.id_gen.generate()),
            title: Set(input.title),
            description: Set(input.description),
            price: Set(input.price),
            category: Set(category),
            location: Set(input.location),
            phone: Set(input.phone),
            image_urls: Set(serde_json::json!(urls)),
            image_keys: Set(serde_json::json!(keys)),
            affiliate_link: Set(affiliate_link),
            author_id: Set(author.id.clone()),
            status: Set(AdStatus::Pending),
            created_at: Set(chrono::Utc::now().into()),
            updated_at: Set(None),
        };

        self.ad_repo.create(model).await
    }

    /// Update an ad. Owner-or-admin gated; always demotes back to `pending`.
    pub async fn update(
        &self,
        id: &str,
        actor: &user::Model,
        input: UpdateAdInput,
        new_images: Vec<ImageUpload>,
    ) -> AppResult<ad::Model> {
        let ad = self.ad_repo.get_by_id(id).await?;
        ensure_can_modify(actor, &ad)?;

        input.validate()?;
        let category = parse_category(&input.category)?;

        let old_keys = ad.image_key_list();
        let existing_affiliate = ad.affiliate_link.clone();

        let mut active: ad::ActiveModel = ad.into();
        active.title = Set(input.title);
        active.description = Set(input.description);
        active.price = Set(input.price);
        active.category = Set(category);
        active.location = Set(input.location);
        active.phone = Set(input.phone);

        // Non-admins cannot touch an existing affiliate link
        active.affiliate_link = Set(if actor.is_admin() {
            input.affiliate_link
        } else {
            existing_affiliate
        });

        if !new_images.is_empty() {
            let stored = self.upload_images(&actor.id, &new_images).await?;
            let (urls, keys) = split_stored(&stored);

            for key in &old_keys {
                if let Err(e) = self.storage.delete(key).await {
                    tracing::warn!(error = %e, key = %key, "Failed to delete replaced image");
                }
            }

            active.image_urls = Set(serde_json::json!(urls));
            active.image_keys = Set(serde_json::json!(keys));
        }

        // Every edit goes back through moderation
        active.status = Set(AdStatus::Pending);
        active.updated_at = Set(Some(chrono::Utc::now().into()));

        self.ad_repo.update(active).await
    }

    /// Delete an ad and request deletion of its images.
    pub async fn delete(&self, id: &str, actor: &user::Model) -> AppResult<()> {
        let ad = self.ad_repo.get_by_id(id).await?;
        ensure_can_modify(actor, &ad)?;

        for key in ad.image_key_list() {
            if let Err(e) = self.storage.delete(&key).await {
                tracing::warn!(error = %e, key = %key, "Failed to delete ad image");
            }
        }

        self.ad_repo.delete(id).await
    }

    /// Get an ad for public display.
    ///
    /// Non-approved ads are visible only to their owner and admins;
    /// everyone else gets the same not-found as a missing id.
    pub async fn get_public(
        &self,
        id: &str,
        viewer: Option<&user::Model>,
    ) -> AppResult<ad::Model> {
        let ad = self.ad_repo.get_by_id(id).await?;

        if ad.status == AdStatus::Approved {
            return Ok(ad);
        }

        match viewer {
            Some(user) if user.id == ad.author_id || user.is_admin() => Ok(ad),
            _ => Err(AppError::AdNotFound(id.to_string())),
        }
    }

    /// Get an ad for its edit form. Owner-or-admin gated.
    pub async fn get_for_edit(&self, id: &str, actor: &user::Model) -> AppResult<ad::Model> {
        let ad = self.ad_repo.get_by_id(id).await?;
        ensure_can_modify(actor, &ad)?;
        Ok(ad)
    }

    /// Approved ads for the public listing. `page` is one-based.
    pub async fn list_approved(&self, page: u64, per_page: u64) -> AppResult<PaginatedAds> {
        let page = page.max(1);
        let (items, total_items, total_pages) = self
            .ad_repo
            .find_paginated(Some(AdStatus::Approved), page - 1, per_page)
            .await?;

        Ok(PaginatedAds {
            items,
            page,
            per_page,
            total_items,
            total_pages,
        })
    }

    /// Ads for the admin moderation screen, optionally filtered by status.
    pub async fn list_admin(
        &self,
        status: Option<AdStatus>,
        page: u64,
        per_page: u64,
    ) -> AppResult<PaginatedAds> {
        let page = page.max(1);
        let (items, total_items, total_pages) = self
            .ad_repo
            .find_paginated(status, page - 1, per_page)
            .await?;

        Ok(PaginatedAds {
            items,
            page,
            per_page,
            total_items,
            total_pages,
        })
    }

    /// Most recent approved ads (home page strip).
    pub async fn recent_approved(&self, limit: u64) -> AppResult<Vec<ad::Model>> {
        self.ad_repo.find_recent_approved(limit).await
    }

    /// All of an author's ads, grouped by status (own profile view).
    pub async fn ads_for_author(&self, author_id: &str) -> AppResult<AuthorAds> {
        let ads = self.ad_repo.find_by_author(author_id).await?;

        let mut grouped = AuthorAds::default();
        for ad in ads {
            match ad.status {
                AdStatus::Approved => grouped.approved.push(ad),
                AdStatus::Pending => grouped.pending.push(ad),
                AdStatus::Rejected => grouped.rejected.push(ad),
            }
        }

        Ok(grouped)
    }

    /// An author's approved ads (public profile view).
    pub async fn approved_ads_for_author(&self, author_id: &str) -> AppResult<Vec<ad::Model>> {
        self.ad_repo.find_approved_by_author(author_id).await
    }

    /// Upload a batch of images concurrently, all-or-nothing.
    async fn upload_images(
        &self,
        owner_id: &str,
        images: &[ImageUpload],
    ) -> AppResult<Vec<StoredImage>> {
        if images.is_empty() {
            return Err(AppError::Validation(
                "Vous devez télécharger au moins une image.".to_string(),
            ));
        }

        if images.len() > MAX_IMAGES_PER_LISTING {
            return Err(AppError::Validation(format!(
                "Au maximum {MAX_IMAGES_PER_LISTING} images par annonce."
            )));
        }

        // Reject bad payloads before touching the network
        for image in images {
            validate_image_upload(&image.data, &image.content_type)?;
        }

        let uploads = images.iter().map(|image| {
            let key = generate_storage_key(owner_id, &image.filename);
            let storage = Arc::clone(&self.storage);
            async move { storage.upload(&key, &image.data, &image.content_type).await }
        });

        let results = futures::future::join_all(uploads).await;

        let mut stored = Vec::with_capacity(results.len());
        let mut first_error = None;
        for result in results {
            match result {
                Ok(image) => stored.push(image),
                Err(e) => {
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                }
            }
        }

        // One failed upload aborts the batch; completed uploads are orphans
        // at the host and get cleaned up best-effort.
        if let Some(err) = first_error {
            for image in &stored {
                if let Err(e) = self.storage.delete(&image.key).await {
                    tracing::warn!(error = %e, key = %image.key, "Failed to clean up orphan upload");
                }
            }
            return Err(err);
        }

        Ok(stored)
    }
}

fn parse_category(label: &str) -> AppResult<Category> {
    Category::from_label(label)
        .ok_or_else(|| AppError::Validation("Catégorie invalide.".to_string()))
}

fn ensure_can_modify(actor: &user::Model, ad: &ad::Model) -> AppResult<()> {
    if actor.id == ad.author_id || actor.is_admin() {
        Ok(())
    } else {
        Err(AppError::Forbidden("Action non autorisée.".to_string()))
    }
}

fn split_stored(stored: &[StoredImage]) -> (Vec<String>, Vec<String>) {
    let urls = stored.iter().map(|s| s.url.clone()).collect();
    let keys = stored.iter().map(|s| s.key.clone()).collect();
    (urls, keys)
}
