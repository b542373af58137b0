use std::time::Duration;

#[cfg(feature = "config")]
use core_config::{ConfigError, FromEnv, env_parse_or};

use crate::common::RetryConfig;

/// MongoDB connection and operation settings.
///
/// Construct manually or, with the `config` feature, via [`FromEnv`].
///
/// ```ignore
/// let config = MongoConfig::with_database("mongodb://localhost:27017", "users")
///     .with_app_name("users-api");
/// ```
#[derive(Clone, Debug)]
pub struct MongoConfig {
    /// Connection string, always carrying a `mongodb://` or `mongodb+srv://` scheme
    pub url: String,

    pub database: String,

    /// Reported to the server in connection handshakes
    pub app_name: Option<String>,

    pub max_pool_size: u32,
    pub min_pool_size: u32,

    pub connect_timeout_secs: u64,
    pub server_selection_timeout_secs: u64,

    /// Per-call budget applied to every request-scoped store operation
    pub operation_timeout_secs: u64,

    /// Extra connection attempts at startup after the first one fails
    pub connect_retries: u32,
}

impl MongoConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: normalize_url(&url.into()),
            ..Self::default()
        }
    }

    pub fn with_database(url: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            ..Self::new(url)
        }
    }

    pub fn with_app_name(mut self, app_name: impl Into<String>) -> Self {
        self.app_name = Some(app_name.into());
        self
    }

    pub fn with_pool_size(mut self, max_pool_size: u32, min_pool_size: u32) -> Self {
        self.max_pool_size = max_pool_size;
        self.min_pool_size = min_pool_size;
        self
    }

    pub fn with_operation_timeout(mut self, secs: u64) -> Self {
        self.operation_timeout_secs = secs;
        self
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn server_selection_timeout(&self) -> Duration {
        Duration::from_secs(self.server_selection_timeout_secs)
    }

    pub fn operation_timeout(&self) -> Duration {
        Duration::from_secs(self.operation_timeout_secs)
    }

    /// Startup retry policy derived from `connect_retries`
    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig::new().with_max_retries(self.connect_retries)
    }
}

impl Default for MongoConfig {
    fn default() -> Self {
        Self {
            url: "mongodb://localhost:27017".to_string(),
            database: "users".to_string(),
            app_name: None,
            max_pool_size: 100,
            min_pool_size: 5,
            connect_timeout_secs: 10,
            server_selection_timeout_secs: 30,
            operation_timeout_secs: 10,
            connect_retries: 3,
        }
    }
}

/// Prefixes a bare `host:port` with `mongodb://`; blank input falls back to localhost.
pub fn normalize_url(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        "mongodb://localhost:27017".to_string()
    } else if trimmed.starts_with("mongodb://") || trimmed.starts_with("mongodb+srv://") {
        trimmed.to_string()
    } else {
        format!("mongodb://{}", trimmed)
    }
}

/// Environment variables:
/// - `MONGODB_URL` or `MONGO_URL` (required)
/// - `MONGODB_DATABASE` or `MONGO_DATABASE` (required)
/// - `MONGODB_APP_NAME` (optional)
/// - `MONGODB_MAX_POOL_SIZE` (default: 100)
/// - `MONGODB_MIN_POOL_SIZE` (default: 5)
/// - `MONGODB_CONNECT_TIMEOUT_SECS` (default: 10)
/// - `MONGODB_SERVER_SELECTION_TIMEOUT_SECS` (default: 30)
/// - `MONGODB_OPERATION_TIMEOUT_SECS` (default: 10, must be positive)
/// - `MONGODB_CONNECT_RETRIES` (default: 3)
#[cfg(feature = "config")]
impl FromEnv for MongoConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let url = std::env::var("MONGODB_URL")
            .or_else(|_| std::env::var("MONGO_URL"))
            .map_err(|_| ConfigError::MissingEnvVar("MONGODB_URL or MONGO_URL".to_string()))?;

        let database = std::env::var("MONGODB_DATABASE")
            .or_else(|_| std::env::var("MONGO_DATABASE"))
            .map_err(|_| {
                ConfigError::MissingEnvVar("MONGODB_DATABASE or MONGO_DATABASE".to_string())
            })?;

        let operation_timeout_secs: u64 = env_parse_or("MONGODB_OPERATION_TIMEOUT_SECS", "10")?;
        if operation_timeout_secs == 0 {
            return Err(ConfigError::ParseError {
                key: "MONGODB_OPERATION_TIMEOUT_SECS".to_string(),
                details: "must be at least 1 second".to_string(),
            });
        }

        Ok(Self {
            url: normalize_url(&url),
            database,
            app_name: std::env::var("MONGODB_APP_NAME").ok(),
            max_pool_size: env_parse_or("MONGODB_MAX_POOL_SIZE", "100")?,
            min_pool_size: env_parse_or("MONGODB_MIN_POOL_SIZE", "5")?,
            connect_timeout_secs: env_parse_or("MONGODB_CONNECT_TIMEOUT_SECS", "10")?,
            server_selection_timeout_secs: env_parse_or(
                "MONGODB_SERVER_SELECTION_TIMEOUT_SECS",
                "30",
            )?,
            operation_timeout_secs,
            connect_retries: env_parse_or("MONGODB_CONNECT_RETRIES", "3")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mongo_config_defaults() {
        let config = MongoConfig::new("mongodb://localhost:27017");
        assert_eq!(config.database, "users");
        assert_eq!(config.max_pool_size, 100);
        assert_eq!(config.min_pool_size, 5);
        assert_eq!(config.operation_timeout(), Duration::from_secs(10));
        assert_eq!(config.retry_config().max_retries, 3);
    }

    #[test]
    fn test_mongo_config_builders() {
        let config = MongoConfig::with_database("db.internal:27017", "crm")
            .with_app_name("users-api")
            .with_pool_size(20, 2)
            .with_operation_timeout(3);

        assert_eq!(config.url, "mongodb://db.internal:27017");
        assert_eq!(config.database, "crm");
        assert_eq!(config.app_name.as_deref(), Some("users-api"));
        assert_eq!((config.max_pool_size, config.min_pool_size), (20, 2));
        assert_eq!(config.operation_timeout_secs, 3);
    }

    #[test]
    fn test_normalize_url() {
        assert_eq!(normalize_url("  "), "mongodb://localhost:27017");
        assert_eq!(normalize_url("mongo:27017"), "mongodb://mongo:27017");
        assert_eq!(
            normalize_url("mongodb+srv://cluster.example.net"),
            "mongodb+srv://cluster.example.net"
        );
        assert_eq!(
            normalize_url(" mongodb://user:pw@host/db "),
            "mongodb://user:pw@host/db"
        );
    }

    #[cfg(feature = "config")]
    #[test]
    fn test_mongo_config_from_env() {
        temp_env::with_vars(
            [
                ("MONGODB_URL", Some("mongodb://localhost:27017")),
                ("MONGODB_DATABASE", Some("testdb")),
                ("MONGODB_OPERATION_TIMEOUT_SECS", Some("2")),
                ("MONGODB_CONNECT_RETRIES", None::<&str>),
            ],
            || {
                let config = MongoConfig::from_env().unwrap();
                assert_eq!(config.url, "mongodb://localhost:27017");
                assert_eq!(config.database, "testdb");
                assert_eq!(config.operation_timeout_secs, 2);
                assert_eq!(config.connect_retries, 3);
            },
        );
    }

    #[cfg(feature = "config")]
    #[test]
    fn test_mongo_config_from_env_fallback() {
        temp_env::with_vars(
            [
                ("MONGODB_URL", None::<&str>),
                ("MONGO_URL", Some("fallback:27017")),
                ("MONGODB_DATABASE", None::<&str>),
                ("MONGO_DATABASE", Some("fallbackdb")),
            ],
            || {
                let config = MongoConfig::from_env().unwrap();
                assert_eq!(config.url, "mongodb://fallback:27017");
                assert_eq!(config.database, "fallbackdb");
            },
        );
    }

    #[cfg(feature = "config")]
    #[test]
    fn test_mongo_config_from_env_missing_url() {
        temp_env::with_vars(
            [
                ("MONGODB_URL", None::<&str>),
                ("MONGO_URL", None::<&str>),
                ("MONGODB_DATABASE", Some("testdb")),
            ],
            || {
                assert!(MongoConfig::from_env().is_err());
            },
        );
    }

    #[cfg(feature = "config")]
    #[test]
    fn test_mongo_config_from_env_rejects_zero_operation_timeout() {
        temp_env::with_vars(
            [
                ("MONGODB_URL", Some("mongodb://localhost:27017")),
                ("MONGODB_DATABASE", Some("testdb")),
                ("MONGODB_OPERATION_TIMEOUT_SECS", Some("0")),
            ],
            || {
                let err = MongoConfig::from_env().unwrap_err();
                assert!(matches!(
                    err,
                    ConfigError::ParseError { ref key, .. } if key == "MONGODB_OPERATION_TIMEOUT_SECS"
                ));
            },
        );
    }

    #[cfg(feature = "config")]
    #[test]
    fn test_mongo_config_from_env_bad_number() {
        temp_env::with_vars(
            [
                ("MONGODB_URL", Some("mongodb://localhost:27017")),
                ("MONGODB_DATABASE", Some("testdb")),
                ("MONGODB_MAX_POOL_SIZE", Some("lots")),
            ],
            || {
                let err = MongoConfig::from_env().unwrap_err();
                assert!(err.to_string().contains("MONGODB_MAX_POOL_SIZE"));
            },
        );
    }
}
