//! Upload adapter for listing and profile images.
//!
//! Supports a local filesystem backend for development and a remote
//! image-host backend that buffers the payload in memory and streams it
//! over HTTPS. Uploaded assets are addressed by an opaque key which also
//! serves as the deletion handle.

use std::path::PathBuf;

use sha2::{Digest, Sha256};

use crate::{AppError, AppResult};

/// Maximum accepted image payload (5 MiB).
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// Maximum number of images per listing submission.
pub const MAX_IMAGES_PER_LISTING: usize = 6;

/// Accepted raster image content types.
const ALLOWED_CONTENT_TYPES: [&str; 4] =
    ["image/jpeg", "image/png", "image/gif", "image/webp"];

/// Stored image metadata returned by every backend.
#[derive(Debug, Clone)]
pub struct StoredImage {
    /// Opaque key; doubles as the deletion handle.
    pub key: String,
    /// Stable public URL to access the image.
    pub url: String,
    /// Image size in bytes.
    pub size: u64,
    /// MIME content type.
    pub content_type: String,
    /// MD5 hash of the payload.
    pub md5: String,
}

/// Storage backend trait.
#[async_trait::async_trait]
pub trait StorageBackend: Send + Sync {
    /// Upload an image payload.
    async fn upload(&self, key: &str, data: &[u8], content_type: &str) -> AppResult<StoredImage>;

    /// Delete a previously stored image by its key.
    async fn delete(&self, key: &str) -> AppResult<()>;

    /// Get the public URL for a key.
    fn public_url(&self, key: &str) -> String;
}

/// Validate an image payload before any network call.
///
/// Checks the content type allowlist, the size ceiling, and that the
/// payload actually decodes as a raster image.
pub fn validate_image_upload(data: &[u8], content_type: &str) -> AppResult<()> {
    if !ALLOWED_CONTENT_TYPES.contains(&content_type) {
        return Err(AppError::Validation(format!(
            "Unsupported image type: {content_type}. Allowed: jpeg, png, gif, webp"
        )));
    }

    if data.is_empty() {
        return Err(AppError::Validation("Image is empty".to_string()));
    }

    if data.len() > MAX_IMAGE_BYTES {
        return Err(AppError::Validation(format!(
            "Image too large. Maximum size is {MAX_IMAGE_BYTES} bytes"
        )));
    }

    // Decode header only; a payload that lies about its content type fails here.
    image::load_from_memory(data)
        .map_err(|e| AppError::Validation(format!("Invalid image payload: {e}")))?;

    Ok(())
}

/// Local filesystem storage backend.
pub struct LocalStorage {
    base_path: PathBuf,
    base_url: String,
}

impl LocalStorage {
    /// Create a new local storage backend.
    #[must_use]
    pub const fn new(base_path: PathBuf, base_url: String) -> Self {
        Self { base_path, base_url }
    }
}

#[async_trait::async_trait]
impl StorageBackend for LocalStorage {
    async fn upload(&self, key: &str, data: &[u8], content_type: &str) -> AppResult<StoredImage> {
        let path = self.base_path.join(key);

        // Create parent directories if needed
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::Upload(format!("Failed to create directory: {e}")))?;
        }

        tokio::fs::write(&path, data)
            .await
            .map_err(|e| AppError::Upload(format!("Failed to write file: {e}")))?;

        let md5 = format!("{:x}", md5::compute(data));

        Ok(StoredImage {
            key: key.to_string(),
            url: self.public_url(key),
            size: data.len() as u64,
            content_type: content_type.to_string(),
            md5,
        })
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        let path = self.base_path.join(key);
        if path.exists() {
            tokio::fs::remove_file(&path)
                .await
                .map_err(|e| AppError::Upload(format!("Failed to delete file: {e}")))?;
        }
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), key)
    }
}

/// Remote image-host storage backend.
///
/// Speaks the host's multipart upload API: every request carries the API
/// key, a timestamp and a SHA-256 signature over the sorted parameters
/// plus the API secret.
pub struct ImageHostStorage {
    client: reqwest::Client,
    upload_url: String,
    api_key: String,
    api_secret: String,
    folder: String,
}

/// Response from the image host's upload endpoint.
#[derive(Debug, serde::Deserialize)]
struct UploadResponse {
    public_id: String,
    secure_url: String,
}

impl ImageHostStorage {
    /// Create a new image-host storage backend.
    #[must_use]
    pub fn new(upload_url: String, api_key: String, api_secret: String, folder: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            upload_url,
            api_key,
            api_secret,
            folder,
        }
    }

    /// Sign a parameter string: `hex(sha256(params + secret))`.
    fn sign(&self, params: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(params.as_bytes());
        hasher.update(self.api_secret.as_bytes());
        hex::encode(hasher.finalize())
    }

    fn timestamp() -> i64 {
        chrono::Utc::now().timestamp()
    }
}

#[async_trait::async_trait]
impl StorageBackend for ImageHostStorage {
    async fn upload(&self, key: &str, data: &[u8], content_type: &str) -> AppResult<StoredImage> {
        let timestamp = Self::timestamp();
        let params = format!(
            "folder={}&public_id={}&timestamp={}",
            self.folder, key, timestamp
        );
        let signature = self.sign(&params);
        let md5 = format!("{:x}", md5::compute(data));
        let size = data.len() as u64;

        let part = reqwest::multipart::Part::bytes(data.to_vec())
            .file_name(key.to_string())
            .mime_str(content_type)
            .map_err(|e| AppError::Upload(format!("Invalid content type: {e}")))?;

        let form = reqwest::multipart::Form::new()
            .text("api_key", self.api_key.clone())
            .text("timestamp", timestamp.to_string())
            .text("folder", self.folder.clone())
            .text("public_id", key.to_string())
            .text("signature", signature)
            .part("file", part);

        let response = self
            .client
            .post(format!("{}/image/upload", self.upload_url.trim_end_matches('/')))
            .multipart(form)
            .send()
            .await
            .map_err(|e| AppError::Upload(format!("Image host unreachable: {e}")))?;

        if !response.status().is_success() {
            return Err(AppError::Upload(format!(
                "Image host rejected upload: {}",
                response.status()
            )));
        }

        let uploaded: UploadResponse = response
            .json()
            .await
            .map_err(|e| AppError::Upload(format!("Invalid image host response: {e}")))?;

        Ok(StoredImage {
            key: uploaded.public_id,
            url: uploaded.secure_url,
            size,
            content_type: content_type.to_string(),
            md5,
        })
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        let timestamp = Self::timestamp();
        let params = format!("public_id={key}&timestamp={timestamp}");
        let signature = self.sign(&params);

        let response = self
            .client
            .post(format!("{}/image/destroy", self.upload_url.trim_end_matches('/')))
            .form(&[
                ("api_key", self.api_key.as_str()),
                ("timestamp", &timestamp.to_string()),
                ("public_id", key),
                ("signature", &signature),
            ])
            .send()
            .await
            .map_err(|e| AppError::Upload(format!("Image host unreachable: {e}")))?;

        if !response.status().is_success() {
            return Err(AppError::Upload(format!(
                "Image host rejected deletion: {}",
                response.status()
            )));
        }

        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        format!(
            "{}/image/{}/{}",
            self.upload_url.trim_end_matches('/'),
            self.folder,
            key
        )
    }
}

/// Generate a unique storage key for an uploaded file.
#[must_use]
pub fn generate_storage_key(owner_id: &str, original_name: &str) -> String {
    use chrono::Utc;

    let now = Utc::now();
    let date_path = now.format("%Y/%m/%d").to_string();
    let timestamp = now.timestamp_millis();

    // Extract extension from original name
    let extension = original_name
        .rfind('.')
        .filter(|&pos| pos > 0 && pos < original_name.len() - 1)
        .map(|pos| &original_name[pos + 1..])
        .filter(|ext| ext.len() <= 10 && !ext.is_empty())
        .unwrap_or("bin");

    format!(
        "{}/{}/{}_{}.{}",
        date_path,
        owner_id,
        timestamp,
        uuid::Uuid::new_v4(),
        extension
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    /// A 1x1 PNG, the smallest payload that decodes.
    fn tiny_png() -> Vec<u8> {
        vec![
            0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a, 0x1a, 0x0a, 0x00, 0x00, 0x00, 0x0d, 0x49, 0x48,
            0x44, 0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00,
            0x00, 0x1f, 0x15, 0xc4, 0x89, 0x00, 0x00, 0x00, 0x0d, 0x49, 0x44, 0x41, 0x54, 0x78,
            0x9c, 0x62, 0x00, 0x01, 0x00, 0x00, 0x05, 0x00, 0x01, 0x0d, 0x0a, 0x2d, 0xb4, 0x00,
            0x00, 0x00, 0x00, 0x49, 0x45, 0x4e, 0x44, 0xae, 0x42, 0x60, 0x82,
        ]
    }

    #[test]
    fn test_generate_storage_key() {
        let key = generate_storage_key("user123", "photo.jpg");
        assert!(key.contains("user123"));
        assert!(key.ends_with(".jpg"));
        assert!(key.contains('/'));
    }

    #[test]
    fn test_generate_storage_key_no_extension() {
        let key = generate_storage_key("user123", "file");
        assert!(key.ends_with(".bin"));
    }

    #[test]
    fn test_validate_rejects_unsupported_type() {
        let result = validate_image_upload(&tiny_png(), "image/tiff");
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn test_validate_rejects_oversized_payload() {
        let data = vec![0u8; MAX_IMAGE_BYTES + 1];
        let result = validate_image_upload(&data, "image/png");
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn test_validate_rejects_non_image_payload() {
        let result = validate_image_upload(b"definitely not a png", "image/png");
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn test_validate_accepts_real_png() {
        assert!(validate_image_upload(&tiny_png(), "image/png").is_ok());
    }

    #[tokio::test]
    async fn test_local_storage_roundtrip() {
        let dir = std::env::temp_dir().join(format!("market-test-{}", uuid::Uuid::new_v4()));
        let storage = LocalStorage::new(dir.clone(), "/uploads".to_string());

        let stored = storage
            .upload("2025/01/01/test.png", &tiny_png(), "image/png")
            .await
            .unwrap();
        assert_eq!(stored.url, "/uploads/2025/01/01/test.png");
        assert_eq!(stored.content_type, "image/png");

        storage.delete("2025/01/01/test.png").await.unwrap();
        assert!(!dir.join("2025/01/01/test.png").exists());

        tokio::fs::remove_dir_all(&dir).await.ok();
    }

    #[test]
    fn test_signature_is_deterministic() {
        let storage = ImageHostStorage::new(
            "https://images.example.com/v1".to_string(),
            "key".to_string(),
            "secret".to_string(),
            "afrikmarket".to_string(),
        );

        let a = storage.sign("public_id=abc&timestamp=1700000000");
        let b = storage.sign("public_id=abc&timestamp=1700000000");
        let c = storage.sign("public_id=abc&timestamp=1700000001");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 64); // hex-encoded SHA-256
    }
}
