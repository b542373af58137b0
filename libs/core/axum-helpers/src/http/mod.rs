//! HTTP-level layers: CORS, security headers, request ids.
//!
//! ```ignore
//! use axum_helpers::http::{cors_layer_from_env, security_headers};
//!
//! let app = Router::new()
//!     .layer(axum::middleware::from_fn(security_headers))
//!     .layer(cors_layer_from_env()?);
//! ```

pub mod cors;
pub mod request_id;
pub mod security;

pub use cors::{create_cors_layer, cors_layer_from_env, parse_allowed_origins};
pub use request_id::{REQUEST_ID_HEADER, propagate_request_id_layer, set_request_id_layer};
pub use security::security_headers;
