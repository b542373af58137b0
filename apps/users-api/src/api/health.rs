//! Readiness endpoint

use axum::{Json, Router, extract::State, http::StatusCode, routing::get};
use axum_helpers::{HealthCheckFuture, run_health_checks};
use database::mongodb::check_health_detailed;
use serde_json::Value;

use crate::state::AppState;

/// Create a readiness router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/ready", get(readiness_check))
        .with_state(state)
}

/// Readiness check - pings MongoDB within the per-request deadline
async fn readiness_check(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<Value>), (StatusCode, Json<Value>)> {
    let ctx = state.scope.begin();

    let mongodb: HealthCheckFuture<'_> = Box::pin(async {
        match ctx.run(check_health_detailed(&state.store)).await {
            Ok(status) if status.healthy => Ok(()),
            Ok(status) => Err(status.message.unwrap_or_else(|| "ping failed".to_string())),
            Err(reason) => Err(reason.to_string()),
        }
    });

    run_health_checks(vec![("mongodb", mongodb)]).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, Environment, UsersConfig};
    use axum::body::Body;
    use axum::http::Request;
    use core_config::{app_info, server::ServerConfig};
    use database::OperationScope;
    use database::mongodb::{Client, DocumentStore, MongoConfig};
    use http_body_util::BodyExt;
    use std::time::Duration;
    use tokio_util::sync::CancellationToken;
    use tower::ServiceExt;

    async fn unreachable_state(shutdown: CancellationToken) -> AppState {
        let client = Client::with_uri_str("mongodb://127.0.0.1:1").await.unwrap();
        AppState {
            config: Config {
                app: app_info!(),
                mongodb: MongoConfig::default(),
                server: ServerConfig::default(),
                users: UsersConfig {
                    collection: "users".to_string(),
                    max_page_size: 100,
                },
                environment: Environment::Development,
            },
            store: DocumentStore::from_client(client, "users"),
            scope: OperationScope::new(Duration::from_millis(100), shutdown),
        }
    }

    async fn ready(state: AppState) -> (StatusCode, Value) {
        let response = router(state)
            .oneshot(Request::get("/ready").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_unreachable_store_is_not_ready() {
        let (status, body) = ready(unreachable_state(CancellationToken::new()).await).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["status"], "not ready");
        assert_eq!(body["mongodb"], "disconnected");
    }

    #[tokio::test]
    async fn test_closed_store_is_not_ready() {
        let state = unreachable_state(CancellationToken::new()).await;
        assert!(state.store.disconnect().await);

        let (status, body) = ready(state).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["mongodb"], "disconnected");
    }
}
