//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `SALESO_API_BASE_URL` - Base URL of the Saleso backend API
//!
//! ## Optional
//! - `SALESO_LOGIN_URL` - Login entry point shown when a session expires (default: /login)
//! - `SALESO_SESSION_FILE` - Path of the persisted session store (default: .saleso/session.json)
//! - `SALESO_CATEGORY_CACHE_TTL_SECS` - Category tree cache TTL in seconds (default: 300)
//! - `SALESO_USER_AGENT` - User-Agent header (default: saleso-client/<version>)

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_LOGIN_URL: &str = "/login";
const DEFAULT_SESSION_FILE: &str = ".saleso/session.json";
const DEFAULT_CATEGORY_CACHE_TTL_SECS: u64 = 300;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Saleso client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Backend base URL; request paths are appended to it
    pub api_base_url: Url,
    /// Where a user is sent to sign in again after the session expires
    pub login_url: String,
    /// Location of the file-backed session store
    pub session_file: PathBuf,
    /// How long the category tree is served from cache
    pub category_cache_ttl: Duration,
    /// User-Agent sent with every request
    pub user_agent: String,
}

impl ClientConfig {
    /// Build a configuration with defaults for everything but the base URL.
    #[must_use]
    pub fn new(api_base_url: Url) -> Self {
        Self {
            api_base_url,
            login_url: DEFAULT_LOGIN_URL.to_string(),
            session_file: PathBuf::from(DEFAULT_SESSION_FILE),
            category_cache_ttl: Duration::from_secs(DEFAULT_CATEGORY_CACHE_TTL_SECS),
            user_agent: default_user_agent(),
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let api_base_url = parse_base_url(&get_required_env("SALESO_API_BASE_URL")?)?;
        let login_url = get_env_or_default("SALESO_LOGIN_URL", DEFAULT_LOGIN_URL);
        let session_file =
            PathBuf::from(get_env_or_default("SALESO_SESSION_FILE", DEFAULT_SESSION_FILE));
        let ttl_secs = get_env_or_default(
            "SALESO_CATEGORY_CACHE_TTL_SECS",
            &DEFAULT_CATEGORY_CACHE_TTL_SECS.to_string(),
        )
        .parse::<u64>()
        .map_err(|e| {
            ConfigError::InvalidEnvVar("SALESO_CATEGORY_CACHE_TTL_SECS".to_string(), e.to_string())
        })?;
        let user_agent =
            get_optional_env("SALESO_USER_AGENT").unwrap_or_else(default_user_agent);

        Ok(Self {
            api_base_url,
            login_url,
            session_file,
            category_cache_ttl: Duration::from_secs(ttl_secs),
            user_agent,
        })
    }
}

fn default_user_agent() -> String {
    format!("saleso-client/{}", env!("CARGO_PKG_VERSION"))
}

/// Parse and sanity-check the API base URL.
fn parse_base_url(value: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(value).map_err(|e| {
        ConfigError::InvalidEnvVar("SALESO_API_BASE_URL".to_string(), e.to_string())
    })?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            "SALESO_API_BASE_URL".to_string(),
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }

    if url.query().is_some() || url.fragment().is_some() {
        return Err(ConfigError::InvalidEnvVar(
            "SALESO_API_BASE_URL".to_string(),
            "must not contain a query or fragment".to_string(),
        ));
    }

    Ok(url)
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_base_url_accepts_http_and_https() {
        assert!(parse_base_url("http://localhost:8080").is_ok());
        assert!(parse_base_url("https://api.saleso.example/v1").is_ok());
    }

    #[test]
    fn test_parse_base_url_rejects_other_schemes() {
        let err = parse_base_url("ftp://files.example").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(_, _)));
    }

    #[test]
    fn test_parse_base_url_rejects_query() {
        assert!(parse_base_url("https://api.example/?debug=1").is_err());
        assert!(parse_base_url("not a url").is_err());
    }

    #[test]
    fn test_new_uses_defaults() {
        let config = ClientConfig::new(Url::parse("http://localhost:8080").unwrap());
        assert_eq!(config.login_url, "/login");
        assert_eq!(config.session_file, PathBuf::from(".saleso/session.json"));
        assert_eq!(config.category_cache_ttl, Duration::from_secs(300));
        assert!(config.user_agent.starts_with("saleso-client/"));
    }
}
