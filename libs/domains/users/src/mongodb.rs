//! MongoDB implementation of UserRepository

use async_trait::async_trait;
use database::OperationContext;
use database::mongodb::{DocumentStore, MongoRepository};
use mongodb::bson::doc;
use tracing::instrument;

use crate::error::{UserError, UserResult};
use crate::models::User;
use crate::repository::UserRepository;

pub const DEFAULT_COLLECTION: &str = "users";

/// Users collection on top of the generic [`MongoRepository`].
///
/// ```ignore
/// let store = DocumentStore::connect_with_retry(&config, None).await?;
/// let repo = MongoUserRepository::new(&store);
/// ```
#[derive(Debug, Clone)]
pub struct MongoUserRepository {
    base: MongoRepository<User>,
}

impl MongoUserRepository {
    pub fn new(store: &DocumentStore) -> Self {
        Self::with_collection(store, DEFAULT_COLLECTION)
    }

    pub fn with_collection(store: &DocumentStore, collection: &str) -> Self {
        Self {
            base: MongoRepository::new(store, collection),
        }
    }

    /// The generic repository underneath, for operations this type does not wrap
    pub fn base(&self) -> &MongoRepository<User> {
        &self.base
    }
}

#[async_trait]
impl UserRepository for MongoUserRepository {
    async fn create(&self, ctx: &OperationContext, user: &User) -> UserResult<User> {
        let inserted = self.base.create(ctx, user).await?;
        Ok(User {
            id: Some(inserted.id),
            date_created: Some(inserted.created_at),
            date_updated: Some(inserted.created_at),
            ..user.clone()
        })
    }

    async fn find_by_id(&self, ctx: &OperationContext, id: &str) -> UserResult<User> {
        Ok(self.base.find_by_id(ctx, id).await?)
    }

    async fn find_all(
        &self,
        ctx: &OperationContext,
        page: u64,
        limit: u64,
    ) -> UserResult<Vec<User>> {
        Ok(self.base.find_all(ctx, page, limit).await?)
    }

    async fn update(&self, ctx: &OperationContext, id: &str, user: &User) -> UserResult<()> {
        Ok(self.base.update(ctx, id, user).await?)
    }

    async fn delete(&self, ctx: &OperationContext, id: &str) -> UserResult<()> {
        Ok(self.base.delete(ctx, id).await?)
    }

    async fn count(&self, ctx: &OperationContext) -> UserResult<u64> {
        Ok(self.base.count(ctx).await?)
    }

    #[instrument(skip(self, ctx))]
    async fn find_by_email(&self, ctx: &OperationContext, email: &str) -> UserResult<User> {
        self.base
            .find_one(ctx, "find_by_email", doc! { "email": email })
            .await?
            .ok_or_else(|| UserError::NotFound(format!("email={}", email)))
    }
}
