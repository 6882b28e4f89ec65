//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `FLORICULTURA_API_URL` - Backend base URL (default: `http://localhost:8000`)
//! - `FLORICULTURA_TIMEOUT_SECS` - Per-request timeout (default: 30)
//! - `FLORICULTURA_CATALOG_TTL_SECS` - Product list cache TTL, 0 disables (default: 300)
//! - `FLORICULTURA_SESSION_FILE` - Where the session token is persisted
//!   (default: `.floricultura-session.json`)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_API_URL: &str = "http://localhost:8000";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_CATALOG_TTL_SECS: u64 = 300;
const DEFAULT_SESSION_FILE: &str = ".floricultura-session.json";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Client configuration.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Backend base URL; endpoint paths are joined onto it.
    pub api_url: Url,
    /// Timeout applied to every request.
    pub timeout: Duration,
    /// How long the product list stays cached. Zero disables caching.
    pub catalog_ttl: Duration,
    /// File backing the durable credential store.
    pub session_file: PathBuf,
    /// Sentry DSN for error tracking.
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g. "production").
    pub sentry_environment: Option<String>,
}

impl StoreConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let api_url = parse_api_url(
            "FLORICULTURA_API_URL",
            &get_env_or_default("FLORICULTURA_API_URL", DEFAULT_API_URL),
        )?;
        let timeout = parse_secs(
            "FLORICULTURA_TIMEOUT_SECS",
            get_optional_env("FLORICULTURA_TIMEOUT_SECS").as_deref(),
            DEFAULT_TIMEOUT_SECS,
        )?;
        let catalog_ttl = parse_secs(
            "FLORICULTURA_CATALOG_TTL_SECS",
            get_optional_env("FLORICULTURA_CATALOG_TTL_SECS").as_deref(),
            DEFAULT_CATALOG_TTL_SECS,
        )?;
        let session_file = PathBuf::from(get_env_or_default(
            "FLORICULTURA_SESSION_FILE",
            DEFAULT_SESSION_FILE,
        ));

        Ok(Self {
            api_url,
            timeout,
            catalog_ttl,
            session_file,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Configuration pointing at `api_url` with every other setting defaulted.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if `api_url` is not an absolute
    /// http(s) URL.
    pub fn for_api_url(api_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            api_url: parse_api_url("api_url", api_url)?,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            catalog_ttl: Duration::from_secs(DEFAULT_CATALOG_TTL_SECS),
            session_file: PathBuf::from(DEFAULT_SESSION_FILE),
            sentry_dsn: None,
            sentry_environment: None,
        })
    }

    /// Build the absolute URL for an endpoint path such as `/carrinho`.
    #[must_use]
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.api_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Parse and check the backend base URL.
fn parse_api_url(key: &str, value: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }
    Ok(url)
}

/// Parse a whole number of seconds, falling back to `default` when unset.
fn parse_secs(key: &str, value: Option<&str>, default: u64) -> Result<Duration, ConfigError> {
    value.map_or(Ok(Duration::from_secs(default)), |raw| {
        raw.trim()
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    })
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_api_url() {
        assert!(parse_api_url("K", "http://localhost:8000").is_ok());
        assert!(parse_api_url("K", "https://api.floricultura.test/v1/").is_ok());
        assert!(matches!(
            parse_api_url("K", "ftp://x"),
            Err(ConfigError::InvalidEnvVar(_, _))
        ));
        assert!(parse_api_url("K", "not a url").is_err());
    }

    #[test]
    fn test_parse_secs() {
        assert_eq!(parse_secs("K", None, 30).unwrap(), Duration::from_secs(30));
        assert_eq!(parse_secs("K", Some(" 5 "), 30).unwrap(), Duration::from_secs(5));
        assert_eq!(parse_secs("K", Some("0"), 30).unwrap(), Duration::ZERO);
        assert!(parse_secs("K", Some("-1"), 30).is_err());
    }

    #[test]
    fn test_endpoint_joins_paths() {
        let config = StoreConfig::for_api_url("http://localhost:8000/").unwrap();
        assert_eq!(config.endpoint("/carrinho"), "http://localhost:8000/carrinho");

        let nested = StoreConfig::for_api_url("https://api.test/v1/").unwrap();
        assert_eq!(
            nested.endpoint("carrinho/quantidade"),
            "https://api.test/v1/carrinho/quantidade"
        );
    }
}
