//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `DATABASE_URL` - `PostgreSQL` connection string (not needed with
//!   `STORESYNC_MEMORY_STORE=true`)
//! - `JWT_SECRET` - HS256 key used to verify bearer tokens (min 32 chars, high entropy)
//!
//! ## Optional
//! - `STORESYNC_MEMORY_STORE` - Use the in-process store instead of `PostgreSQL` (default: false)
//! - `HOST` - Bind address (default: 127.0.0.1)
//! - `PORT` - Listen port (default: 3000)
//! - `CORS_ORIGIN` - Allowed browser origin
//! - `REMOTE_API_VERSION` - Remote Admin API version (default: 2025-01)
//! - `REMOTE_TIMEOUT_SECS` - Per-request remote timeout (default: 30)
//! - `SYNC_CONCURRENCY` - Concurrent upserts per phase (default: 8)
//! - `SYNC_FETCH_ATTEMPTS` - Attempts per remote fetch (default: 2)
//! - `SYNC_TIMEOUT_SECS` - Deadline for one sync (default: 120)
//! - `LOG_FORMAT` - `json` or `text` (default: text)
//! - `SENTRY_DSN`, `SENTRY_ENVIRONMENT`, `SENTRY_SAMPLE_RATE`, `SENTRY_TRACES_SAMPLE_RATE`

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use crate::sync::SyncOptions;

const MIN_JWT_SECRET_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

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

/// Where reconciled data is kept.
#[derive(Clone)]
pub enum StoreBackend {
    Postgres { database_url: SecretString },
    Memory,
}

impl std::fmt::Debug for StoreBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Postgres { .. } => f
                .debug_struct("Postgres")
                .field("database_url", &"[REDACTED]")
                .finish(),
            Self::Memory => f.write_str("Memory"),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(format!("expected `text` or `json`, got {other:?}")),
        }
    }
}

/// Remote store client settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteConfig {
    /// Admin API version in request paths (e.g., 2025-01)
    pub api_version: String,
    /// Timeout for a single remote request
    pub timeout: Duration,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            api_version: "2025-01".to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Storage backend (database URL is secret)
    pub store: StoreBackend,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Bearer token verification key
    pub jwt_secret: SecretString,
    /// Allowed CORS origin; no CORS layer when unset
    pub cors_origin: Option<String>,
    /// Remote store client settings
    pub remote: RemoteConfig,
    /// Sync tuning
    pub sync: SyncOptions,
    /// Log output format
    pub log_format: LogFormat,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate
    pub sentry_traces_sample_rate: f32,
}

impl ServerConfig {
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

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Same as [`ServerConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(&lookup);

        let use_memory: bool = env.parse_or_default("STORESYNC_MEMORY_STORE", false)?;
        let store = if use_memory {
            StoreBackend::Memory
        } else {
            StoreBackend::Postgres {
                database_url: SecretString::from(env.required("DATABASE_URL")?),
            }
        };

        let host = env.parse_or_default("HOST", IpAddr::from([127, 0, 0, 1]))?;
        let port = env.parse_or_default("PORT", 3000_u16)?;

        let jwt_secret = env.required("JWT_SECRET")?;
        validate_secret_strength(&jwt_secret, "JWT_SECRET")?;
        let jwt_secret = SecretString::from(jwt_secret);
        validate_secret_length(&jwt_secret, "JWT_SECRET")?;

        let remote = RemoteConfig {
            api_version: env
                .optional("REMOTE_API_VERSION")
                .unwrap_or_else(|| RemoteConfig::default().api_version),
            timeout: Duration::from_secs(env.parse_positive("REMOTE_TIMEOUT_SECS", 30_u64)?),
        };

        let defaults = SyncOptions::default();
        let sync = SyncOptions {
            concurrency: env.parse_positive("SYNC_CONCURRENCY", defaults.concurrency)?,
            fetch_attempts: env.parse_positive("SYNC_FETCH_ATTEMPTS", defaults.fetch_attempts)?,
            timeout: Duration::from_secs(
                env.parse_positive("SYNC_TIMEOUT_SECS", defaults.timeout.as_secs())?,
            ),
            ..defaults
        };

        let log_format = env.parse_or_default("LOG_FORMAT", LogFormat::Text)?;

        Ok(Self {
            store,
            host,
            port,
            jwt_secret,
            cors_origin: env.optional("CORS_ORIGIN"),
            remote,
            sync,
            log_format,
            sentry_dsn: env.optional("SENTRY_DSN"),
            sentry_environment: env.optional("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: env
                .optional("SENTRY_SAMPLE_RATE")
                .and_then(|s| s.parse().ok())
                .unwrap_or(1.0),
            sentry_traces_sample_rate: env
                .optional("SENTRY_TRACES_SAMPLE_RATE")
                .and_then(|s| s.parse().ok())
                .unwrap_or(1.0),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

struct Env<'a, F>(&'a F);

impl<F> Env<'_, F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Get an optional variable; empty values count as unset.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.trim().is_empty())
    }

    /// Get a required variable.
    fn required(&self, key: &str) -> Result<String, ConfigError> {
        self.optional(key)
            .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
    }

    /// Parse a variable, falling back to `default` when unset.
    fn parse_or_default<T>(&self, key: &str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.optional(key).map_or(Ok(default), |raw| {
            raw.trim()
                .parse()
                .map_err(|e: T::Err| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
        })
    }

    /// Parse a numeric variable that must be greater than zero.
    fn parse_positive<T>(&self, key: &str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr + PartialOrd + Default,
        T::Err: std::fmt::Display,
    {
        let value = self.parse_or_default(key, default)?;
        if value <= T::default() {
            return Err(ConfigError::InvalidEnvVar(
                key.to_string(),
                "must be greater than zero".to_string(),
            ));
        }
        Ok(value)
    }
}

/// Validate that a secret meets minimum length requirements.
fn validate_secret_length(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_JWT_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_JWT_SECRET_LENGTH,
                value.len()
            ),
        ));
    }
    Ok(())
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
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)]
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

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

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const STRONG_SECRET: &str = "aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6%";

    fn load(vars: &[(&str, &str)]) -> Result<ServerConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        ServerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[
            ("DATABASE_URL", "postgres://localhost/storesync"),
            ("JWT_SECRET", STRONG_SECRET),
        ])
        .unwrap();

        assert!(matches!(config.store, StoreBackend::Postgres { .. }));
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:3000");
        assert_eq!(config.remote.api_version, "2025-01");
        assert_eq!(config.remote.timeout, Duration::from_secs(30));
        assert_eq!(config.sync, SyncOptions::default());
        assert_eq!(config.log_format, LogFormat::Text);
        assert!(config.cors_origin.is_none());
        assert!((config.sentry_sample_rate - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_memory_store_needs_no_database_url() {
        let config = load(&[
            ("STORESYNC_MEMORY_STORE", "true"),
            ("JWT_SECRET", STRONG_SECRET),
        ])
        .unwrap();
        assert!(matches!(config.store, StoreBackend::Memory));
    }

    #[test]
    fn test_missing_database_url() {
        let err = load(&[("JWT_SECRET", STRONG_SECRET)]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(key) if key == "DATABASE_URL"));
    }

    #[test]
    fn test_sync_overrides() {
        let config = load(&[
            ("STORESYNC_MEMORY_STORE", "true"),
            ("JWT_SECRET", STRONG_SECRET),
            ("SYNC_CONCURRENCY", "2"),
            ("SYNC_FETCH_ATTEMPTS", "5"),
            ("SYNC_TIMEOUT_SECS", "10"),
            ("LOG_FORMAT", "JSON"),
        ])
        .unwrap();

        assert_eq!(config.sync.concurrency, 2);
        assert_eq!(config.sync.fetch_attempts, 5);
        assert_eq!(config.sync.timeout, Duration::from_secs(10));
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let err = load(&[
            ("STORESYNC_MEMORY_STORE", "true"),
            ("JWT_SECRET", STRONG_SECRET),
            ("SYNC_CONCURRENCY", "0"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(key, _) if key == "SYNC_CONCURRENCY"));
    }

    #[test]
    fn test_invalid_port() {
        let err = load(&[
            ("STORESYNC_MEMORY_STORE", "true"),
            ("JWT_SECRET", STRONG_SECRET),
            ("PORT", "http"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(key, _) if key == "PORT"));
    }

    #[test]
    fn test_placeholder_jwt_secret_rejected() {
        let err = load(&[
            ("STORESYNC_MEMORY_STORE", "true"),
            ("JWT_SECRET", "supersecret"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::InsecureSecret(_, _)));
    }

    #[test]
    fn test_short_jwt_secret_rejected() {
        let err = load(&[
            ("STORESYNC_MEMORY_STORE", "true"),
            ("JWT_SECRET", "aB3$xY9!mK2@nL5#"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::InsecureSecret(_, msg) if msg.contains("at least")));
    }

    #[test]
    fn test_shannon_entropy() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
        assert!((shannon_entropy("aaaaaaa") - 0.0).abs() < f64::EPSILON);
        assert!((shannon_entropy("ab") - 1.0).abs() < 0.01);
        assert!(shannon_entropy(STRONG_SECRET) > MIN_ENTROPY_BITS_PER_CHAR);
    }

    #[test]
    fn test_store_backend_debug_redacts_url() {
        let backend = StoreBackend::Postgres {
            database_url: SecretString::from("postgres://user:hunter2@db/storesync"),
        };
        let debug_output = format!("{backend:?}");
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("hunter2"));
    }

    #[test]
    fn test_log_format_parse() {
        assert_eq!("json".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("Text".parse::<LogFormat>().unwrap(), LogFormat::Text);
        assert!("yaml".parse::<LogFormat>().is_err());
    }
}
