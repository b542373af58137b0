//! Document store access for the users service
//!
//! - [`common`]: repository error taxonomy, startup retry, operation contexts
//!   (deadline + cancellation) shared by every store call
//! - [`mongodb`]: the pooled [`mongodb::DocumentStore`] session and the generic
//!   [`mongodb::MongoRepository`]
//!
//! # Features
//!
//! - `mongodb` (default) - MongoDB session and repository
//! - `config` - `core_config::FromEnv` for [`mongodb::MongoConfig`]
//!
//! # Example
//!
//! ```ignore
//! use database::common::OperationContext;
//! use database::mongodb::{DocumentStore, MongoConfig, MongoRepository};
//!
//! let store = DocumentStore::connect_with_retry(&MongoConfig::from_env()?, None).await?;
//! let widgets: MongoRepository<Widget> = MongoRepository::new(&store, "widgets");
//!
//! let ctx = OperationContext::with_timeout(Duration::from_secs(5));
//! let inserted = widgets.create(&ctx, &widget).await?;
//! let stored = widgets.find_by_id(&ctx, &inserted.id.to_hex()).await?;
//!
//! store.disconnect().await;
//! ```

pub mod common;

#[cfg(feature = "mongodb")]
pub mod mongodb;

pub use common::{ContextError, OperationContext, OperationScope, RepositoryError, RepositoryResult};
