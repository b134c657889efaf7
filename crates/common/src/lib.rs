//! Common utilities and shared types for afrikmarket-rs.
//!
//! This crate provides foundational components used across all
//! afrikmarket-rs crates:
//!
//! - **Configuration**: Application settings via [`Config`]
//! - **Error handling**: Unified error types via [`AppError`] and [`AppResult`]
//! - **ID Generation**: ULID-based unique identifiers via [`IdGenerator`]
//! - **Upload adapter**: Image storage backends (local, remote image host)
//!
//! # Example
//!
//! ```no_run
//! use afrikmarket_common::{Config, IdGenerator, AppResult};
//!
//! fn example() -> AppResult<()> {
//!     let config = Config::load()?;
//!     let id_gen = IdGenerator::new();
//!     let id = id_gen.generate();
//!     println!("Generated ID: {}", id);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod id;
pub mod storage;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use id::IdGenerator;
pub use storage::{
    ImageHostStorage, LocalStorage, StorageBackend, StoredImage, generate_storage_key,
    validate_image_upload, MAX_IMAGE_BYTES, MAX_IMAGES_PER_LISTING,
};
