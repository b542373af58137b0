//! Users API routes
//!
//! This module wires up the users domain to HTTP routes.

use axum::Router;
use domain_users::{MongoUserRepository, UserService, handlers};

use crate::state::AppState;

/// Create users router
pub fn router(state: &AppState) -> Router {
    let repository = MongoUserRepository::with_collection(&state.store, &state.config.users.collection);

    let service = UserService::new(repository).with_max_page_size(state.config.users.max_page_size);

    handlers::router(service, state.scope.clone())
}
