//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `CART_API_URL` - Base URL of the stock/catalog backend (e.g., http://localhost:3333)
//!
//! ## Optional
//! - `CART_API_TOKEN` - Bearer token sent to the backend
//! - `CART_HOST` - Bind address (default: 127.0.0.1)
//! - `CART_PORT` - Listen port (default: 3333)
//! - `CART_STORAGE_DIR` - Directory holding the persisted cart (default: .rocketshoes)
//! - `CART_STORAGE_KEY` - Key the cart is stored under (default: @RocketShoes:cart)
//! - `CART_REQUEST_TIMEOUT_SECS` - Timeout for every backend request (default: 10)
//! - `CART_CATALOG_CACHE_TTL_SECS` - Catalog metadata cache TTL, 0 disables (default: 300)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment tag

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

/// Key the cart has always been stored under in the browser.
pub const DEFAULT_STORAGE_KEY: &str = "@RocketShoes:cart";

const DEFAULT_PORT: &str = "3333";
const DEFAULT_STORAGE_DIR: &str = ".rocketshoes";
const DEFAULT_REQUEST_TIMEOUT_SECS: &str = "10";
const DEFAULT_CATALOG_CACHE_TTL_SECS: &str = "300";

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &["your-", "changeme", "replace", "placeholder", "xxx"];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Storefront cart configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Stock/catalog backend configuration
    pub api: CartApiConfig,
    /// Where the cart is persisted
    pub storage: StorageConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment tag
    pub sentry_environment: Option<String>,
}

/// Stock/catalog backend configuration.
///
/// Implements `Debug` manually to redact the token.
#[derive(Clone)]
pub struct CartApiConfig {
    /// Base URL all endpoints are resolved against
    pub base_url: Url,
    /// Optional bearer token
    pub token: Option<SecretString>,
    /// Timeout applied to every request
    pub request_timeout: Duration,
    /// How long catalog metadata may be served from cache (zero disables)
    pub catalog_cache_ttl: Duration,
}

impl std::fmt::Debug for CartApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartApiConfig")
            .field("base_url", &self.base_url.as_str())
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("request_timeout", &self.request_timeout)
            .field("catalog_cache_ttl", &self.catalog_cache_ttl)
            .finish()
    }
}

/// Persistence configuration.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Directory of the file-backed key/value store
    pub dir: PathBuf,
    /// Key the cart record is stored under
    pub key: String,
}

impl StorefrontConfig {
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
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let vars = Vars(&lookup);

        let host = vars
            .or_default("CART_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("CART_HOST".to_string(), e.to_string()))?;
        let port = vars
            .or_default("CART_PORT", DEFAULT_PORT)
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("CART_PORT".to_string(), e.to_string()))?;

        Ok(Self {
            host,
            port,
            api: CartApiConfig::from_vars(&vars)?,
            storage: StorageConfig {
                dir: PathBuf::from(vars.or_default("CART_STORAGE_DIR", DEFAULT_STORAGE_DIR)),
                key: vars.or_default("CART_STORAGE_KEY", DEFAULT_STORAGE_KEY),
            },
            sentry_dsn: vars.optional("SENTRY_DSN"),
            sentry_environment: vars.optional("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl CartApiConfig {
    /// Configuration pointing at `base_url` with default timeouts.
    #[must_use]
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            token: None,
            request_timeout: Duration::from_secs(10),
            catalog_cache_ttl: Duration::from_secs(300),
        }
    }

    fn from_vars(vars: &Vars<'_>) -> Result<Self, ConfigError> {
        let raw_url = vars.required("CART_API_URL")?;
        let base_url = Url::parse(&raw_url)
            .map_err(|e| ConfigError::InvalidEnvVar("CART_API_URL".to_string(), e.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(ConfigError::InvalidEnvVar(
                "CART_API_URL".to_string(),
                "must be an absolute http(s) URL".to_string(),
            ));
        }

        let token = match vars.optional("CART_API_TOKEN") {
            Some(value) => {
                validate_token(&value, "CART_API_TOKEN")?;
                Some(SecretString::from(value))
            }
            None => None,
        };

        Ok(Self {
            base_url,
            token,
            request_timeout: vars
                .positive_seconds("CART_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS)?,
            catalog_cache_ttl: vars
                .seconds("CART_CATALOG_CACHE_TTL_SECS", DEFAULT_CATALOG_CACHE_TTL_SECS)?,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Thin accessor over a variable lookup function.
struct Vars<'a>(&'a dyn Fn(&str) -> Option<String>);

impl Vars<'_> {
    /// Get a required variable.
    fn required(&self, key: &str) -> Result<String, ConfigError> {
        self.optional(key)
            .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
    }

    /// Get an optional variable. Empty values count as unset.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|value| !value.trim().is_empty())
    }

    /// Get a variable with a default value.
    fn or_default(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }

    /// Get a whole number of seconds.
    fn seconds(&self, key: &str, default: &str) -> Result<Duration, ConfigError> {
        self.or_default(key, default)
            .trim()
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    }

    /// Get a whole number of seconds that must not be zero.
    fn positive_seconds(&self, key: &str, default: &str) -> Result<Duration, ConfigError> {
        let duration = self.seconds(key, default)?;
        if duration.is_zero() {
            return Err(ConfigError::InvalidEnvVar(
                key.to_string(),
                "must be at least 1".to_string(),
            ));
        }
        Ok(duration)
    }
}

/// Reject tokens that are obviously copied from an example file.
fn validate_token(token: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = token.to_lowercase();
    if let Some(pattern) = PLACEHOLDER_PATTERNS.iter().find(|p| lower.contains(*p)) {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!("appears to be a placeholder (contains '{pattern}')"),
        ));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use secrecy::ExposeSecret;

    use super::*;

    fn load(pairs: &[(&str, &str)]) -> Result<StorefrontConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        StorefrontConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[("CART_API_URL", "http://localhost:3333")]).unwrap();

        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:3333");
        assert_eq!(config.storage.key, "@RocketShoes:cart");
        assert_eq!(config.storage.dir, PathBuf::from(".rocketshoes"));
        assert_eq!(config.api.request_timeout, Duration::from_secs(10));
        assert_eq!(config.api.catalog_cache_ttl, Duration::from_secs(300));
        assert!(config.api.token.is_none());
        assert!(config.sentry_dsn.is_none());
    }

    #[test]
    fn test_missing_api_url() {
        let err = load(&[]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref key) if key == "CART_API_URL"));
    }

    #[test]
    fn test_invalid_values() {
        let err = load(&[("CART_API_URL", "not a url")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(_, _)));

        let err = load(&[
            ("CART_API_URL", "http://localhost:3333"),
            ("CART_PORT", "99999"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(ref key, _) if key == "CART_PORT"));

        let err = load(&[
            ("CART_API_URL", "http://localhost:3333"),
            ("CART_REQUEST_TIMEOUT_SECS", "soon"),
        ])
        .unwrap_err();
        assert!(
            matches!(err, ConfigError::InvalidEnvVar(ref key, _) if key == "CART_REQUEST_TIMEOUT_SECS")
        );
    }

    #[test]
    fn test_zero_request_timeout_rejected() {
        let err = load(&[
            ("CART_API_URL", "http://localhost:3333"),
            ("CART_REQUEST_TIMEOUT_SECS", "0"),
        ])
        .unwrap_err();
        assert!(
            matches!(err, ConfigError::InvalidEnvVar(ref key, _) if key == "CART_REQUEST_TIMEOUT_SECS")
        );
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("CART_API_URL", "https://api.rocketshoes.test/v1/"),
            ("CART_API_TOKEN", "k8Jd93hFz1Lq"),
            ("CART_HOST", "0.0.0.0"),
            ("CART_PORT", "8080"),
            ("CART_STORAGE_DIR", "/tmp/carts"),
            ("CART_STORAGE_KEY", "cart:v1"),
            ("CART_CATALOG_CACHE_TTL_SECS", "0"),
        ])
        .unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.api.base_url.as_str(), "https://api.rocketshoes.test/v1/");
        assert_eq!(
            config.api.token.as_ref().unwrap().expose_secret(),
            "k8Jd93hFz1Lq"
        );
        assert_eq!(config.storage.key, "cart:v1");
        assert_eq!(config.api.catalog_cache_ttl, Duration::ZERO);
    }

    #[test]
    fn test_placeholder_token_rejected() {
        let err = load(&[
            ("CART_API_URL", "http://localhost:3333"),
            ("CART_API_TOKEN", "your-token-here"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::InsecureSecret(_, _)));
    }

    #[test]
    fn test_api_config_debug_redacts_token() {
        let mut config = CartApiConfig::new(Url::parse("http://localhost:3333").unwrap());
        config.token = Some(SecretString::from("super_secret_token"));

        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("localhost:3333"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_secret_token"));
    }
}
