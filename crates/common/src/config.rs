//! Application configuration.

use serde::Deserialize;
use std::path::Path;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Session configuration.
    pub session: SessionConfig,
    /// Image storage configuration.
    pub storage: StorageSettings,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind to.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Public URL of this instance.
    pub url: String,
}

/// Database connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// Session configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Secret used to sign the session cookie. Must be at least 32 bytes.
    pub secret: String,
    /// Session lifetime in seconds.
    #[serde(default = "default_session_ttl")]
    pub ttl_seconds: i64,
}

/// Image storage configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    /// Storage backend: "local" or "remote".
    #[serde(default = "default_storage_backend")]
    pub backend: String,
    /// Base path for local storage.
    #[serde(default = "default_local_path")]
    pub local_path: String,
    /// Base URL for serving locally stored files.
    #[serde(default = "default_local_url")]
    pub local_url: String,
    /// Image host API endpoint (remote backend).
    #[serde(default)]
    pub upload_url: Option<String>,
    /// Image host API key (remote backend).
    #[serde(default)]
    pub api_key: Option<String>,
    /// Image host API secret (remote backend).
    #[serde(default)]
    pub api_secret: Option<String>,
    /// Folder/namespace at the image host.
    #[serde(default = "default_storage_folder")]
    pub folder: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    3000
}

const fn default_max_connections() -> u32 {
    100
}

const fn default_min_connections() -> u32 {
    5
}

const fn default_session_ttl() -> i64 {
    60 * 60 * 24
}

fn default_storage_backend() -> String {
    "local".to_string()
}

fn default_local_path() -> String {
    "./uploads".to_string()
}

fn default_local_url() -> String {
    "/uploads".to_string()
}

fn default_storage_folder() -> String {
    "afrikmarket".to_string()
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `config/default.toml`
    /// 2. `config/{environment}.toml` (based on `MARKET_ENV`)
    /// 3. Environment variables with `MARKET_` prefix
    pub fn load() -> Result<Self, crate::AppError> {
        let env = std::env::var("MARKET_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("MARKET")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Self = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, crate::AppError> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix("MARKET")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Self = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Check constraints the type system cannot express.
    ///
    /// The session secret signs cookies and must carry enough entropy;
    /// the remote storage backend needs the full credential set.
    fn validate(&self) -> Result<(), crate::AppError> {
        if self.session.secret.len() < 32 {
            return Err(crate::AppError::Config(
                "session secret must be at least 32 bytes".to_string(),
            ));
        }

        if self.storage.backend == "remote"
            && (self.storage.upload_url.is_none()
                || self.storage.api_key.is_none()
                || self.storage.api_secret.is_none())
        {
            return Err(crate::AppError::Config(
                "remote storage requires upload_url, api_key and api_secret".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn base_config() -> Config {
        Config {
            server: ServerConfig {
                host: default_host(),
                port: default_port(),
                url: "https://market.example.com".to_string(),
            },
            database: DatabaseConfig {
                url: "postgres://localhost/market".to_string(),
                max_connections: default_max_connections(),
                min_connections: default_min_connections(),
            },
            session: SessionConfig {
                secret: "0123456789abcdef0123456789abcdef".to_string(),
                ttl_seconds: default_session_ttl(),
            },
            storage: StorageSettings {
                backend: default_storage_backend(),
                local_path: default_local_path(),
                local_url: default_local_url(),
                upload_url: None,
                api_key: None,
                api_secret: None,
                folder: default_storage_folder(),
            },
        }
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(base_config().validate().is_ok());
    }

    #[test]
    fn test_short_session_secret_rejected() {
        let mut config = base_config();
        config.session.secret = "too-short".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_remote_backend_requires_credentials() {
        let mut config = base_config();
        config.storage.backend = "remote".to_string();
        assert!(config.validate().is_err());

        config.storage.upload_url = Some("https://images.example.com/v1".to_string());
        config.storage.api_key = Some("key".to_string());
        config.storage.api_secret = Some("secret".to_string());
        assert!(config.validate().is_ok());
    }
}
