//! Store-agnostic building blocks: error taxonomy, retry, operation contexts

pub mod context;
pub mod error;
pub mod retry;

pub use context::{ContextError, OperationContext, OperationScope};
pub use error::{BoxError, RepositoryError, RepositoryResult};
pub use retry::{RetryConfig, retry_with_backoff};
