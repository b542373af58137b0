use core_config::{AppInfo, ConfigError, FromEnv, app_info, env_or_default, env_parse_or, server::ServerConfig};

// Import MongoDB config from the database library
use database::mongodb::MongoConfig;

// Re-export Environment for use in other modules
pub use core_config::Environment;

/// Users collection settings
#[derive(Clone, Debug)]
pub struct UsersConfig {
    /// USERS_COLLECTION, default `users`
    pub collection: String,
    /// USERS_MAX_PAGE_SIZE, default 100
    pub max_page_size: u64,
}

impl FromEnv for UsersConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let collection = env_or_default("USERS_COLLECTION", domain_users::mongodb::DEFAULT_COLLECTION);
        if collection.trim().is_empty() {
            return Err(ConfigError::ParseError {
                key: "USERS_COLLECTION".to_string(),
                details: "collection name must not be empty".to_string(),
            });
        }

        Ok(Self {
            collection: collection.trim().to_string(),
            max_page_size: env_parse_or("USERS_MAX_PAGE_SIZE", "100")?,
        })
    }
}

/// Application-specific configuration
/// Composes shared config components from the `config` library
#[derive(Clone, Debug)]
pub struct Config {
    pub app: AppInfo,
    pub mongodb: MongoConfig,
    pub server: ServerConfig,
    pub users: UsersConfig,
    pub environment: Environment,
}

impl Config {
    pub fn from_env() -> eyre::Result<Self> {
        let environment = Environment::from_env();
        let mongodb = MongoConfig::from_env()?;
        let server = ServerConfig::from_env()?;
        let users = UsersConfig::from_env()?;

        Ok(Self {
            app: app_info!(),
            mongodb,
            server,
            users,
            environment,
        })
    }
}
