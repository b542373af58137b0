use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use mongodb::bson::{Document, doc};
use mongodb::options::ClientOptions;
use mongodb::{Client, Collection, Database};
use tracing::{debug, info, instrument};

use super::MongoConfig;
use crate::common::{RetryConfig, retry_with_backoff};

#[derive(Debug, thiserror::Error)]
pub enum MongoError {
    #[error("MongoDB error: {0}")]
    Mongo(#[from] mongodb::error::Error),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
}

/// Pooled session to one MongoDB database.
///
/// Clones share the driver pool and the disconnect flag. The process owner
/// connects once at startup and calls [`DocumentStore::disconnect`] once at
/// shutdown; repositories only borrow collections.
#[derive(Clone, Debug)]
pub struct DocumentStore {
    client: Client,
    database: Database,
    disconnected: Arc<AtomicBool>,
}

impl DocumentStore {
    /// Opens the pool described by `config` and verifies it with a ping.
    #[instrument(skip(config), fields(database = %config.database))]
    pub async fn connect(config: &MongoConfig) -> Result<Self, MongoError> {
        info!("Connecting to MongoDB");

        let mut options = ClientOptions::parse(&config.url).await?;
        options.max_pool_size = Some(config.max_pool_size);
        options.min_pool_size = Some(config.min_pool_size);
        options.connect_timeout = Some(config.connect_timeout());
        options.server_selection_timeout = Some(config.server_selection_timeout());
        if let Some(ref app_name) = config.app_name {
            options.app_name = Some(app_name.clone());
        }

        let client = Client::with_options(options)?;
        let store = Self::from_client(client, &config.database);

        store
            .ping()
            .await
            .map_err(|e| MongoError::ConnectionFailed(e.to_string()))?;

        info!(
            min_pool_size = config.min_pool_size,
            max_pool_size = config.max_pool_size,
            "Connected to MongoDB"
        );
        Ok(store)
    }

    /// [`DocumentStore::connect`] with bounded exponential backoff.
    ///
    /// `None` uses the policy derived from `config.connect_retries`.
    pub async fn connect_with_retry(
        config: &MongoConfig,
        retry: Option<RetryConfig>,
    ) -> Result<Self, MongoError> {
        let retry = retry.unwrap_or_else(|| config.retry_config());
        retry_with_backoff("mongodb connect", || Self::connect(config), retry).await
    }

    /// Wraps an already configured client without pinging it.
    pub fn from_client(client: Client, database: &str) -> Self {
        let database = client.database(database);
        Self {
            client,
            database,
            disconnected: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Handle to a collection of raw documents. Never touches the network.
    pub fn collection(&self, name: &str) -> Collection<Document> {
        self.database.collection::<Document>(name)
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    pub fn database_name(&self) -> &str {
        self.database.name()
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub async fn ping(&self) -> Result<(), MongoError> {
        self.database.run_command(doc! { "ping": 1 }).await?;
        Ok(())
    }

    pub fn is_disconnected(&self) -> bool {
        self.disconnected.load(Ordering::SeqCst)
    }

    /// Closes the pool, waiting for checked-out connections to return.
    ///
    /// Returns `false` when another clone already disconnected.
    pub async fn disconnect(&self) -> bool {
        if self.disconnected.swap(true, Ordering::SeqCst) {
            debug!("MongoDB session already closed");
            return false;
        }

        self.client.clone().shutdown().await;
        info!(database = %self.database_name(), "Disconnected from MongoDB");
        true
    }
}
