//! Application configuration loaded from environment variables.
//!
//! Secrets are injected as environment variables by the deployment (Cloud Run
//! secret bindings), so there is a single loading path.

use chrono_tz::Tz;
use std::env;

const DEFAULT_PERMISSION_CACHE_TTL_SECS: u64 = 300;
const MAX_PERMISSION_CACHE_TTL_SECS: u64 = 24 * 60 * 60;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Frontend URL (allowed CORS origin)
    pub frontend_url: String,
    /// GCP project ID
    pub gcp_project_id: String,
    /// Server port
    pub port: u16,
    /// Timezone used for day bucketing when a request does not name one
    pub default_timezone: Tz,
    /// How long a resolved permission set is reused for one session
    pub permission_cache_ttl_secs: u64,
    /// JWT verification key shared with the identity provider (raw bytes)
    pub jwt_signing_key: Vec<u8>,
}

impl Config {
    /// Config for tests only.
    pub fn test_default() -> Self {
        Self {
            frontend_url: "http://localhost:5173".to_string(),
            gcp_project_id: "test-project".to_string(),
            port: 8080,
            default_timezone: Tz::UTC,
            permission_cache_ttl_secs: DEFAULT_PERMISSION_CACHE_TTL_SECS,
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
        }
    }

    /// Permission cache TTL, capped at one day.
    pub fn permission_cache_ttl(&self) -> chrono::Duration {
        let secs = self
            .permission_cache_ttl_secs
            .min(MAX_PERMISSION_CACHE_TTL_SECS);
        chrono::Duration::seconds(secs as i64)
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let default_timezone = match env::var("DEFAULT_TIMEZONE") {
            Ok(name) => name.trim().parse::<Tz>().map_err(|_| ConfigError::Invalid {
                name: "DEFAULT_TIMEZONE",
                value: name.clone(),
            })?,
            Err(_) => Tz::UTC,
        };

        let permission_cache_ttl_secs = match env::var("PERMISSION_CACHE_TTL_SECS") {
            Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
                name: "PERMISSION_CACHE_TTL_SECS",
                value: raw.clone(),
            })?,
            Err(_) => DEFAULT_PERMISSION_CACHE_TTL_SECS,
        };

        Ok(Self {
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            default_timezone,
            permission_cache_ttl_secs,
            jwt_signing_key: env::var("JWT_SIGNING_KEY")
                .map_err(|_| ConfigError::Missing("JWT_SIGNING_KEY"))?
                .into_bytes(),
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}
