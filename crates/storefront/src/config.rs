//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_DATABASE_URL` - `PostgreSQL` connection string for sessions
//! - `STOREFRONT_BASE_URL` - Public URL for the storefront
//! - `DOCSTORE_PROJECT_ID` - Document store project holding the catalog
//! - `DOCSTORE_API_KEY` - Document store API key (placeholder and entropy checked)
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `STOREFRONT_STORE_NAME` - Store name used in order messages (default: Hellen Moda Fitness)
//! - `STOREFRONT_CATALOG_TTL_SECS` - Catalog cache lifetime (default: 300)
//! - `STOREFRONT_FRESH_STOCK_CHECK` - Re-read a product before stock checks (default: true)
//! - `STOREFRONT_UTC_OFFSET_HOURS` - Offset for order timestamps (default: -3)
//! - `ORDER_CHANNEL_URL_TEMPLATE` - Deep link with `{recipient}` and `{message}` placeholders
//! - `DOCSTORE_BASE_URL` - Document store endpoint (default: https://firestore.googleapis.com)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment tag

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use chrono::FixedOffset;
use secrecy::SecretString;
use thiserror::Error;

use crate::commerce::DEFAULT_CHANNEL_TEMPLATE;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

const DEFAULT_STORE_NAME: &str = "Hellen Moda Fitness";
const DEFAULT_CATALOG_TTL_SECS: &str = "300";
const DEFAULT_UTC_OFFSET_HOURS: &str = "-3";
const DEFAULT_DOCSTORE_BASE_URL: &str = "https://firestore.googleapis.com";

/// Brasília time, used when no offset is configured.
pub const DEFAULT_UTC_OFFSET: FixedOffset = match FixedOffset::west_opt(3 * 3600) {
    Some(offset) => offset,
    None => panic!("invalid default UTC offset"),
};

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
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

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// Cart, stock and order dispatch settings
    pub shop: ShopConfig,
    /// Document store holding the catalog
    pub docstore: DocStoreConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment tag
    pub sentry_environment: Option<String>,
}

/// Shop behaviour settings.
#[derive(Debug, Clone)]
pub struct ShopConfig {
    /// Store name printed in the order message header
    pub store_name: String,
    /// How long catalog reads are cached
    pub catalog_ttl: Duration,
    /// Re-read the product from the store before every stock check
    pub fresh_stock_check: bool,
    /// Offset used to localize order timestamps
    pub utc_offset: FixedOffset,
    /// Messaging deep link with `{recipient}` and `{message}` placeholders
    pub order_channel_template: String,
}

impl Default for ShopConfig {
    fn default() -> Self {
        Self {
            store_name: DEFAULT_STORE_NAME.to_string(),
            catalog_ttl: Duration::from_secs(300),
            fresh_stock_check: true,
            utc_offset: DEFAULT_UTC_OFFSET,
            order_channel_template: DEFAULT_CHANNEL_TEMPLATE.to_string(),
        }
    }
}

/// Document store connection settings.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct DocStoreConfig {
    /// Project that owns the database
    pub project_id: String,
    /// API key sent with every request
    pub api_key: SecretString,
    /// Service endpoint, without the `/v1` path
    pub base_url: String,
}

impl std::fmt::Debug for DocStoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocStoreConfig")
            .field("project_id", &self.project_id)
            .field("api_key", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("STOREFRONT_DATABASE_URL")?;
        let host = parse_env("STOREFRONT_HOST", "127.0.0.1")?;
        let port = parse_env("STOREFRONT_PORT", "3000")?;
        let base_url = get_required_env("STOREFRONT_BASE_URL")?;

        let shop = ShopConfig::from_env()?;
        let docstore = DocStoreConfig::from_env()?;
        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            shop,
            docstore,
            sentry_dsn,
            sentry_environment,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl ShopConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let ttl_secs: u64 = parse_env("STOREFRONT_CATALOG_TTL_SECS", DEFAULT_CATALOG_TTL_SECS)?;
        let fresh_stock_check = parse_bool(
            "STOREFRONT_FRESH_STOCK_CHECK",
            &get_env_or_default("STOREFRONT_FRESH_STOCK_CHECK", "true"),
        )?;
        let utc_offset = parse_utc_offset(
            "STOREFRONT_UTC_OFFSET_HOURS",
            &get_env_or_default("STOREFRONT_UTC_OFFSET_HOURS", DEFAULT_UTC_OFFSET_HOURS),
        )?;
        let order_channel_template =
            get_env_or_default("ORDER_CHANNEL_URL_TEMPLATE", DEFAULT_CHANNEL_TEMPLATE);
        validate_channel_template(&order_channel_template, "ORDER_CHANNEL_URL_TEMPLATE")?;

        Ok(Self {
            store_name: get_env_or_default("STOREFRONT_STORE_NAME", DEFAULT_STORE_NAME),
            catalog_ttl: Duration::from_secs(ttl_secs),
            fresh_stock_check,
            utc_offset,
            order_channel_template,
        })
    }
}

impl DocStoreConfig {
    /// Load only the document store settings. Used by operator tooling.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the project or API key is missing.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        Ok(Self {
            project_id: get_required_env("DOCSTORE_PROJECT_ID")?,
            api_key: get_validated_secret("DOCSTORE_API_KEY")?,
            base_url: get_env_or_default("DOCSTORE_BASE_URL", DEFAULT_DOCSTORE_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get the database URL, falling back to the generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    std::env::var(primary_key)
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    // Check blocklist
    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    // Check entropy (real secrets like API keys have high entropy)
    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}

/// Parse an environment variable (or its default) with `FromStr`.
fn parse_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Parse a boolean flag (`true`/`false`/`1`/`0`/`yes`/`no`).
fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        other => Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("expected a boolean, got '{other}'"),
        )),
    }
}

/// Parse a whole-hour UTC offset such as `-3` or `+1`.
fn parse_utc_offset(key: &str, value: &str) -> Result<FixedOffset, ConfigError> {
    let hours: i32 = value
        .trim()
        .trim_start_matches('+')
        .parse()
        .map_err(|e: std::num::ParseIntError| {
            ConfigError::InvalidEnvVar(key.to_string(), e.to_string())
        })?;
    if !(-12..=14).contains(&hours) {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("offset {hours} is outside -12..=14"),
        ));
    }
    FixedOffset::east_opt(hours * 3600).ok_or_else(|| {
        ConfigError::InvalidEnvVar(key.to_string(), format!("invalid offset {hours}"))
    })
}

/// Ensure the deep-link template can carry both the recipient and the message.
fn validate_channel_template(template: &str, var_name: &str) -> Result<(), ConfigError> {
    for placeholder in ["{recipient}", "{message}"] {
        if !template.contains(placeholder) {
            return Err(ConfigError::InvalidEnvVar(
                var_name.to_string(),
                format!("missing {placeholder} placeholder"),
            ));
        }
    }
    Ok(())
}
