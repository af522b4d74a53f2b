//! Cart synchronization configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `CART_API_BASE_URL` - Base URL of the remote cart service (e.g. `https://shop.example/api`)
//!
//! ## Optional
//! - `CART_API_TOKEN` - Bearer token sent with every cart request
//! - `CART_API_TIMEOUT_SECS` - Transport timeout for cart requests (default: 10)
//! - `CART_STORE_PATH` - Location of the local cart record (default: `.cartsync/cart.json`)
//! - `CART_CURRENCY` - ISO 4217 code used when displaying prices (default: USD)

use std::path::PathBuf;
use std::time::Duration;

use cartsync_core::CurrencyCode;
use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_STORE_PATH: &str = ".cartsync/cart.json";

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "put-your",
];

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

/// Top-level configuration for a cart client.
#[derive(Debug, Clone)]
pub struct CartSyncConfig {
    /// Remote cart service configuration
    pub remote: RemoteCartConfig,
    /// Path of the local cart record
    pub store_path: PathBuf,
    /// Currency used for display formatting
    pub currency: CurrencyCode,
}

/// Remote cart service configuration.
///
/// Implements `Debug` manually to redact the API token.
#[derive(Clone)]
pub struct RemoteCartConfig {
    /// Base URL; cart endpoints are resolved relative to it
    pub base_url: Url,
    /// Bearer token for the cart API
    pub api_token: Option<SecretString>,
    /// Transport timeout per request
    pub timeout: Duration,
}

impl std::fmt::Debug for RemoteCartConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteCartConfig")
            .field("base_url", &self.base_url.as_str())
            .field(
                "api_token",
                &self.api_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl RemoteCartConfig {
    /// Configuration for an unauthenticated service with the default timeout.
    #[must_use]
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            api_token: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl CartSyncConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid, or
    /// if the API token looks like a placeholder.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Same as [`CartSyncConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let vars = Vars(&lookup);

        let base_url = vars.required("CART_API_BASE_URL")?;
        let base_url = Url::parse(&base_url).map_err(|e| {
            ConfigError::InvalidEnvVar("CART_API_BASE_URL".to_string(), e.to_string())
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ConfigError::InvalidEnvVar(
                "CART_API_BASE_URL".to_string(),
                "must be a hierarchical http(s) URL".to_string(),
            ));
        }

        let api_token = vars
            .optional("CART_API_TOKEN")
            .map(|token| validated_secret(token, "CART_API_TOKEN"))
            .transpose()?;

        let timeout_secs = vars
            .or_default("CART_API_TIMEOUT_SECS", &DEFAULT_TIMEOUT_SECS.to_string())
            .parse::<u64>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("CART_API_TIMEOUT_SECS".to_string(), e.to_string())
            })?;

        let store_path = PathBuf::from(vars.or_default("CART_STORE_PATH", DEFAULT_STORE_PATH));

        let currency_code = vars.or_default("CART_CURRENCY", CurrencyCode::default().code());
        let currency = CurrencyCode::from_code(&currency_code).ok_or_else(|| {
            ConfigError::InvalidEnvVar(
                "CART_CURRENCY".to_string(),
                format!("unsupported currency code '{currency_code}'"),
            )
        })?;

        Ok(Self {
            remote: RemoteCartConfig {
                base_url,
                api_token,
                timeout: Duration::from_secs(timeout_secs),
            },
            store_path,
            currency,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

struct Vars<'a, F>(&'a F);

impl<F: Fn(&str) -> Option<String>> Vars<'_, F> {
    /// Get a required variable; empty values count as missing.
    fn required(&self, key: &str) -> Result<String, ConfigError> {
        self.optional(key)
            .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
    }

    /// Get an optional variable; empty values count as unset.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|value| !value.trim().is_empty())
    }

    /// Get a variable with a default value.
    fn or_default(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }
}

/// Reject obvious placeholder secrets.
fn validated_secret(value: String, var_name: &str) -> Result<SecretString, ConfigError> {
    let lower = value.to_lowercase();
    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }
    Ok(SecretString::from(value))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use secrecy::ExposeSecret;

    use super::*;

    fn load(pairs: &[(&str, &str)]) -> Result<CartSyncConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        CartSyncConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[("CART_API_BASE_URL", "https://shop.example/api/")]).unwrap();
        assert_eq!(config.remote.base_url.as_str(), "https://shop.example/api/");
        assert!(config.remote.api_token.is_none());
        assert_eq!(config.remote.timeout, Duration::from_secs(10));
        assert_eq!(config.store_path, PathBuf::from(".cartsync/cart.json"));
        assert_eq!(config.currency, CurrencyCode::USD);
    }

    #[test]
    fn test_missing_base_url() {
        assert!(matches!(
            load(&[]),
            Err(ConfigError::MissingEnvVar(key)) if key == "CART_API_BASE_URL"
        ));
        assert!(matches!(
            load(&[("CART_API_BASE_URL", "  ")]),
            Err(ConfigError::MissingEnvVar(_))
        ));
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            load(&[("CART_API_BASE_URL", "not a url")]),
            Err(ConfigError::InvalidEnvVar(_, _))
        ));
        assert!(matches!(
            load(&[("CART_API_BASE_URL", "mailto:shop@example.com")]),
            Err(ConfigError::InvalidEnvVar(_, _))
        ));
        assert!(matches!(
            load(&[
                ("CART_API_BASE_URL", "https://shop.example"),
                ("CART_API_TIMEOUT_SECS", "soon"),
            ]),
            Err(ConfigError::InvalidEnvVar(key, _)) if key == "CART_API_TIMEOUT_SECS"
        ));
        assert!(matches!(
            load(&[
                ("CART_API_BASE_URL", "https://shop.example"),
                ("CART_CURRENCY", "XYZ"),
            ]),
            Err(ConfigError::InvalidEnvVar(key, _)) if key == "CART_CURRENCY"
        ));
    }

    #[test]
    fn test_placeholder_token_rejected() {
        let result = load(&[
            ("CART_API_BASE_URL", "https://shop.example"),
            ("CART_API_TOKEN", "your-token-here"),
        ]);
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("CART_API_BASE_URL", "http://127.0.0.1:8080"),
            ("CART_API_TOKEN", "k9Qw2LmZr81vTx"),
            ("CART_API_TIMEOUT_SECS", "3"),
            ("CART_STORE_PATH", "/tmp/cart.json"),
            ("CART_CURRENCY", "eur"),
        ])
        .unwrap();
        assert_eq!(config.remote.timeout, Duration::from_secs(3));
        assert_eq!(config.store_path, PathBuf::from("/tmp/cart.json"));
        assert_eq!(config.currency, CurrencyCode::EUR);
        assert_eq!(
            config.remote.api_token.unwrap().expose_secret(),
            "k9Qw2LmZr81vTx"
        );
    }

    #[test]
    fn test_remote_config_debug_redacts_token() {
        let mut remote = RemoteCartConfig::new(Url::parse("https://shop.example").unwrap());
        remote.api_token = Some(SecretString::from("super_secret_cart_token"));

        let debug_output = format!("{remote:?}");
        assert!(debug_output.contains("shop.example"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_secret_cart_token"));
    }
}
