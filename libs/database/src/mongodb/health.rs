use std::time::Instant;

use super::DocumentStore;

/// Result of a timed ping
#[derive(Debug, Clone)]
pub struct HealthStatus {
    pub healthy: bool,
    /// Error text when unhealthy
    pub message: Option<String>,
    pub response_time_ms: u64,
}

/// Ping the store and report latency
///
/// ```ignore
/// let status = check_health_detailed(&store).await;
/// if !status.healthy {
///     warn!(error = ?status.message, "MongoDB unhealthy");
/// }
/// ```
pub async fn check_health_detailed(store: &DocumentStore) -> HealthStatus {
    if store.is_disconnected() {
        return HealthStatus {
            healthy: false,
            message: Some("session closed".to_string()),
            response_time_ms: 0,
        };
    }

    let start = Instant::now();
    let result = store.ping().await;
    let response_time_ms = start.elapsed().as_millis() as u64;

    HealthStatus {
        healthy: result.is_ok(),
        message: result.err().map(|e| e.to_string()),
        response_time_ms,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::Client;

    #[tokio::test]
    async fn test_closed_store_is_unhealthy() {
        let client = Client::with_uri_str("mongodb://127.0.0.1:1").await.unwrap();
        let store = DocumentStore::from_client(client, "health_test");
        store.disconnect().await;

        let status = check_health_detailed(&store).await;
        assert!(!status.healthy);
        assert_eq!(status.message.as_deref(), Some("session closed"));
    }

    #[tokio::test]
    #[ignore] // Requires actual MongoDB
    async fn test_check_health_detailed() {
        let client = Client::with_uri_str("mongodb://localhost:27017")
            .await
            .unwrap();
        let store = DocumentStore::from_client(client, "health_test");
        let status = check_health_detailed(&store).await;
        assert!(status.healthy);
        assert!(status.message.is_none());
    }
}
