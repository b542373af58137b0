use super::shutdown::ShutdownCoordinator;
use crate::errors::handlers::{method_not_allowed, not_found};
use crate::http::{
    cors_layer_from_env, propagate_request_id_layer, security::security_headers,
    set_request_id_layer,
};
use axum::{Router, body::Body, http::Request, middleware};
use core_config::server::ServerConfig;
use std::future::{Future, IntoFuture};
use std::io;
use std::time::Duration;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::{DefaultOnResponse, TraceLayer};
use tracing::{Level, info, warn};
use utoipa::OpenApi;

/// How long handlers get to answer after in-flight operations are canceled.
const CANCEL_GRACE: Duration = Duration::from_secs(2);

/// Router with docs UIs, API routes under `base_path`, and the common layers.
///
/// `CORS_ALLOWED_ORIGIN` is required; see [`cors_layer_from_env`].
///
/// - OpenAPI documentation (Swagger UI, ReDoc, RapiDoc, Scalar)
/// - `x-request-id` set when absent and echoed on responses
/// - Tracing, security headers, CORS, compression
/// - JSON 404 and 405 fallbacks
///
/// Health endpoints are merged by the app.
pub async fn create_router<T>(apis: Router, base_path: &str) -> io::Result<Router>
where
    T: OpenApi + 'static,
{
    Ok(create_router_with_cors::<T>(apis, base_path, cors_layer_from_env()?))
}

/// [`create_router`] with an explicit CORS layer.
pub fn create_router_with_cors<T>(apis: Router, base_path: &str, cors: CorsLayer) -> Router
where
    T: OpenApi + 'static,
{
    use utoipa_rapidoc::RapiDoc;
    use utoipa_redoc::{Redoc, Servable as RedocServable};
    use utoipa_scalar::{Scalar, Servable as ScalarServable};
    use utoipa_swagger_ui::SwaggerUi;

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", T::openapi()))
        .merge(Redoc::with_url("/redoc", T::openapi()))
        .merge(RapiDoc::new("/api-docs/openapi.json").path("/rapidoc"))
        .merge(Scalar::with_url("/scalar", T::openapi()))
        .nest(base_path, apis)
        .fallback(not_found)
        .method_not_allowed_fallback(method_not_allowed)
        .layer(propagate_request_id_layer())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<Body>| {
                    let request_id = request
                        .headers()
                        .get(crate::http::REQUEST_ID_HEADER)
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("-");
                    tracing::info_span!(
                        "request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = %request_id,
                    )
                })
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(set_request_id_layer())
        .layer(middleware::from_fn(security_headers))
        .layer(cors)
        .layer(CompressionLayer::new())
}

/// Serves `router` until shutdown, then runs `cleanup` once.
///
/// 1. SIGINT/SIGTERM (or [`ShutdownCoordinator::shutdown`]) stops accepting
///    connections; in-flight requests drain.
/// 2. If draining outlasts `server_config.shutdown_timeout`, the
///    coordinator's operations token is canceled so pending store calls
///    return promptly. Connections still open after a short grace are dropped.
/// 3. `cleanup` runs after the server has stopped, bounded by the same timeout.
///
/// ```ignore
/// let shutdown = ShutdownCoordinator::new();
/// let scope = OperationScope::new(op_timeout, shutdown.operations_token());
/// // ... build router with `scope` ...
/// create_production_app(router, &config.server, shutdown, async move {
///     store.disconnect().await;
/// })
/// .await?;
/// ```
pub async fn create_production_app<F>(
    router: Router,
    server_config: &ServerConfig,
    coordinator: ShutdownCoordinator,
    cleanup: F,
) -> io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = tokio::net::TcpListener::bind(server_config.address()).await?;
    info!("Server starting on {}", listener.local_addr()?);

    let shutdown_timeout = server_config.shutdown_timeout;

    let signals = coordinator.clone();
    let signal_task = tokio::spawn(async move { signals.wait_for_signal().await });

    let draining = coordinator.clone();
    let serve = axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(async move { draining.wait_for_shutdown().await })
        .into_future();
    let mut serve = std::pin::pin!(serve);

    let serve_result = tokio::select! {
        result = &mut serve => result,
        _ = drain_deadline(&coordinator, shutdown_timeout) => {
            warn!(
                "Requests still running {:?} after shutdown began",
                shutdown_timeout
            );
            coordinator.cancel_operations();
            match tokio::time::timeout(CANCEL_GRACE, &mut serve).await {
                Ok(result) => result,
                Err(_) => {
                    warn!("Dropping connections that ignored cancellation");
                    Ok(())
                }
            }
        }
    };

    if let Err(ref e) = serve_result {
        tracing::error!("Server encountered an error: {:?}", e);
    }

    // Nothing may outlive the server and touch a closed store.
    coordinator.cancel_operations();
    signal_task.abort();

    info!("Running cleanup (timeout: {:?})", shutdown_timeout);
    match tokio::time::timeout(shutdown_timeout, cleanup).await {
        Ok(()) => info!("Cleanup completed"),
        Err(_) => warn!(
            "Cleanup exceeded timeout of {:?}, forcing shutdown",
            shutdown_timeout
        ),
    }

    serve_result
}

async fn drain_deadline(coordinator: &ShutdownCoordinator, timeout: Duration) {
    coordinator.wait_for_shutdown().await;
    tokio::time::sleep(timeout).await;
}
