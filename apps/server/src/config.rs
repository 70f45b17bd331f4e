//! Server configuration module.
//!
//! Configuration is loaded from environment variables with fallback to
//! defaults that suit local development.

use std::env;

use bayon_core::KhrPerUsd;

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the HTTP server binds to.
    pub bind_addr: String,

    /// Path to the SQLite database file.
    pub database_path: String,

    /// Fallback KHR/USD rate when no row exists for today.
    pub default_rate: KhrPerUsd,

    /// Base URL of the KHQR status-check gateway. When unset, KHQR sales
    /// are accepted without a gateway check (development mode).
    pub khqr_base_url: Option<String>,
}

impl ServerConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let default_rate_riel: i64 = env::var("BAYON_DEFAULT_RATE")
            .unwrap_or_else(|_| "4100".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("BAYON_DEFAULT_RATE".to_string()))?;

        let default_rate = KhrPerUsd::new(default_rate_riel);
        if !default_rate.is_valid() {
            return Err(ConfigError::InvalidValue("BAYON_DEFAULT_RATE".to_string()));
        }

        Ok(ServerConfig {
            bind_addr: env::var("BAYON_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string()),

            database_path: env::var("BAYON_DATABASE_PATH")
                .unwrap_or_else(|_| "./bayon_dev.db".to_string()),

            default_rate,

            khqr_base_url: env::var("BAYON_KHQR_BASE_URL")
                .ok()
                .map(|url| url.trim_end_matches('/').to_string())
                .filter(|url| !url.is_empty()),
        })
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}
