//! MongoDB test infrastructure
//!
//! Provides a `TestMongo` helper that starts a MongoDB container and hands out
//! connected [`DocumentStore`]s.

use database::mongodb::{DocumentStore, MongoConfig};
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, ImageExt};
use testcontainers_modules::mongo::Mongo;

/// Test MongoDB wrapper that ensures proper cleanup
///
/// The container is automatically stopped and removed when this struct is dropped.
///
/// # Example
///
/// ```no_run
/// use test_utils::TestMongo;
///
/// # async fn example() {
/// let mongo = TestMongo::new().await;
/// let store = mongo.store("my_test_db").await;
/// // Build repositories on `store`
/// # }
/// ```
pub struct TestMongo {
    #[allow(dead_code)]
    container: ContainerAsync<Mongo>,
    pub connection_string: String,
}

impl TestMongo {
    /// Start a MongoDB 7 container
    pub async fn new() -> Self {
        let container = Mongo::default()
            .with_tag("7")
            .start()
            .await
            .expect("Failed to start MongoDB container");

        let host_port = container
            .get_host_port_ipv4(27017)
            .await
            .expect("Failed to get MongoDB port");

        let connection_string = format!("mongodb://127.0.0.1:{}", host_port);

        tracing::info!(port = host_port, "Test MongoDB ready (mongo:7)");

        Self {
            container,
            connection_string,
        }
    }

    /// Config pointing at this container, with short timeouts
    pub fn config(&self, database: &str) -> MongoConfig {
        MongoConfig {
            connect_timeout_secs: 5,
            server_selection_timeout_secs: 5,
            min_pool_size: 0,
            ..MongoConfig::with_database(self.connection_string.clone(), database)
                .with_app_name("test-utils")
        }
    }

    /// Connected store on `database`. Use a distinct name per test.
    pub async fn store(&self, database: &str) -> DocumentStore {
        DocumentStore::connect(&self.config(database))
            .await
            .expect("Failed to connect to test MongoDB")
    }

    /// Get the connection string for manual client creation
    pub fn connection_string(&self) -> &str {
        &self.connection_string
    }
}

// Container is automatically cleaned up when TestMongo is dropped
impl Drop for TestMongo {
    fn drop(&mut self) {
        tracing::debug!("Cleaning up test MongoDB container");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[ignore] // Requires Docker
    async fn test_store_connects_and_disconnects_once() {
        let mongo = TestMongo::new().await;
        let store = mongo.store("test_utils_smoke").await;

        store.ping().await.unwrap();
        assert!(store.disconnect().await);
        assert!(!store.disconnect().await);
    }
}
