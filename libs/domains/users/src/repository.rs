use async_trait::async_trait;
use database::OperationContext;

use crate::error::UserResult;
use crate::models::User;

/// Repository trait for User persistence
///
/// Every call runs under `ctx` and fails with `Canceled` or
/// `DeadlineExceeded` instead of returning a partial result.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a user and return it with the id and timestamps the store assigned
    async fn create(&self, ctx: &OperationContext, user: &User) -> UserResult<User>;

    async fn find_by_id(&self, ctx: &OperationContext, id: &str) -> UserResult<User>;

    /// One page of users ordered by id; `page` is 1-based and used as given
    async fn find_all(&self, ctx: &OperationContext, page: u64, limit: u64)
    -> UserResult<Vec<User>>;

    async fn update(&self, ctx: &OperationContext, id: &str, user: &User) -> UserResult<()>;

    /// Delete a user; a missing id is not an error
    async fn delete(&self, ctx: &OperationContext, id: &str) -> UserResult<()>;

    async fn count(&self, ctx: &OperationContext) -> UserResult<u64>;

    /// Exact-match lookup; `NotFound` when no user has this email
    async fn find_by_email(&self, ctx: &OperationContext, email: &str) -> UserResult<User>;
}
