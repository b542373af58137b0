//! # Axum Helpers
//!
//! Shared HTTP plumbing for the service binaries.
//!
//! - **[`server`]**: router assembly with OpenAPI UIs, health, two-phase graceful shutdown
//! - **[`http`]**: CORS, security headers, request ids
//! - **[`errors`]**: [`AppError`] and the JSON [`ErrorResponse`] envelope with [`ErrorCode`]s
//! - **[`extractors`]**: [`ValidatedJson`]
//!
//! ## Quick Start
//!
//! ```ignore
//! use axum_helpers::server::{ShutdownCoordinator, create_production_app, create_router};
//!
//! let router = create_router::<ApiDoc>(api_routes, "/api/v1").await?;
//! create_production_app(router, &ServerConfig::default(), ShutdownCoordinator::new(), async {}).await?;
//! ```

pub mod errors;
pub mod extractors;
pub mod http;
pub mod server;

pub use server::{
    HealthCheckFuture, HealthResponse, ShutdownCoordinator, create_production_app, create_router,
    create_router_with_cors, health_router, run_health_checks,
};

pub use http::{cors_layer_from_env, create_cors_layer, security_headers};

pub use errors::{AppError, ErrorCode, ErrorResponse};

pub use extractors::ValidatedJson;
