//! Application state management.
//!
//! This module defines the shared application state passed to route builders.

use database::OperationScope;
use database::mongodb::DocumentStore;

/// Shared application state.
///
/// Cloning is inexpensive: the store shares one driver pool and the scope
/// shares one shutdown token.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration loaded from environment variables
    pub config: crate::config::Config,
    /// MongoDB session owned by `main`; disconnected once at shutdown
    pub store: DocumentStore,
    /// Source of per-request operation contexts
    pub scope: OperationScope,
}
