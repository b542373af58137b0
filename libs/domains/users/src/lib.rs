//! Users Domain
//!
//! CRUD over a MongoDB `users` collection.
//!
//! # Features
//!
//! - User CRUD operations with normalized pagination
//! - Email uniqueness pre-check on create and update
//! - Password hashing with Argon2 (generated when omitted)
//! - Every store call bounded by a per-request deadline and the process shutdown token
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │  Handlers   │  ← HTTP endpoints, one OperationContext per request
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │   Service   │  ← Pagination, duplicate check, password hashing
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │ Repository  │  ← UserRepository trait + MongoUserRepository
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │  database   │  ← MongoRepository<User> over DocumentStore
//! └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use database::{OperationScope, mongodb::DocumentStore};
//! use domain_users::{MongoUserRepository, UserService, handlers};
//!
//! let store = DocumentStore::connect_with_retry(&config, None).await?;
//! let service = UserService::new(MongoUserRepository::new(&store));
//! let scope = OperationScope::new(config.operation_timeout(), shutdown.operations_token());
//!
//! let router = handlers::router(service, scope);
//! ```

pub mod error;
pub mod handlers;
pub mod models;
pub mod mongodb;
pub mod repository;
pub mod service;

// Re-export commonly used types
pub use error::{UserError, UserResult};
pub use handlers::ApiDoc;
pub use models::{ListParams, NewUser, Pagination, UpdateUser, User, UserPage, UserResponse};
pub use crate::mongodb::MongoUserRepository;
pub use repository::UserRepository;
pub use service::UserService;
