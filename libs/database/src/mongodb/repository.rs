//! Generic CRUD over one collection.
//!
//! Identity translation, timestamps, pagination and document (de)serialization
//! live here once. Entity-specific repositories wrap a [`MongoRepository`] and
//! add their own filtered lookups through [`MongoRepository::find_one`].

use std::future::IntoFuture;
use std::marker::PhantomData;

use futures::TryStreamExt;
use mongodb::Collection;
use mongodb::bson::oid::ObjectId;
use mongodb::bson::{self, DateTime, Document, doc};
use mongodb::options::FindOptions;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use super::DocumentStore;
use crate::common::{OperationContext, RepositoryError, RepositoryResult};

pub const ID_FIELD: &str = "_id";
pub const CREATED_AT_FIELD: &str = "date_created";
pub const UPDATED_AT_FIELD: &str = "updated_created";

/// Fields owned by the repository; an entity's own values are discarded on write.
const SERVER_ASSIGNED_FIELDS: [&str; 3] = [ID_FIELD, CREATED_AT_FIELD, UPDATED_AT_FIELD];

/// A type persisted as one document.
///
/// The defaults go through serde. Override them when the stored shape differs
/// from the Rust shape.
pub trait Entity: Serialize + DeserializeOwned + Send + Sync + Unpin + 'static {
    /// Client-controlled fields only; identity and timestamps are stripped.
    fn encode(&self) -> Result<Document, bson::ser::Error> {
        let mut document = bson::to_document(self)?;
        for field in SERVER_ASSIGNED_FIELDS {
            document.remove(field);
        }
        Ok(document)
    }

    fn decode(document: Document) -> Result<Self, bson::de::Error> {
        bson::from_document(document)
    }
}

/// Parses a 24-character hex identity. Runs before any I/O.
pub fn parse_id(id: &str) -> RepositoryResult<ObjectId> {
    ObjectId::parse_str(id.trim()).map_err(|_| RepositoryError::InvalidIdentity(id.to_string()))
}

/// Identity and creation stamp written by [`MongoRepository::create`].
///
/// `date_created` and `updated_created` both hold `created_at` after the insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Inserted {
    pub id: ObjectId,
    pub created_at: DateTime,
}

/// Documents skipped before `page`, saturating at the largest skip the driver
/// can encode (`i64::MAX`). Far-out pages then come back empty.
fn page_offset(page: u64, limit: u64) -> u64 {
    page.saturating_sub(1).saturating_mul(limit).min(i64::MAX as u64)
}

pub struct MongoRepository<T> {
    collection: Collection<Document>,
    _entity: PhantomData<fn() -> T>,
}

impl<T> Clone for MongoRepository<T> {
    fn clone(&self) -> Self {
        Self {
            collection: self.collection.clone(),
            _entity: PhantomData,
        }
    }
}

impl<T> std::fmt::Debug for MongoRepository<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MongoRepository")
            .field("collection", &self.collection.name())
            .finish()
    }
}

impl<T: Entity> MongoRepository<T> {
    pub fn new(store: &DocumentStore, collection: &str) -> Self {
        Self::from_collection(store.collection(collection))
    }

    pub fn from_collection(collection: Collection<Document>) -> Self {
        Self {
            collection,
            _entity: PhantomData,
        }
    }

    pub fn collection(&self) -> &Collection<Document> {
        &self.collection
    }

    pub fn collection_name(&self) -> &str {
        self.collection.name()
    }

    /// Runs a driver action under `ctx`, mapping interruption and driver
    /// failures into [`RepositoryError`].
    pub async fn execute<F, O>(
        &self,
        ctx: &OperationContext,
        operation: &'static str,
        action: F,
    ) -> RepositoryResult<O>
    where
        F: IntoFuture<Output = mongodb::error::Result<O>>,
    {
        ctx.run(action)
            .await
            .map_err(|reason| RepositoryError::interrupted(operation, self.collection_name(), reason))?
            .map_err(|e| RepositoryError::persistence(operation, self.collection_name(), e))
    }

    fn decode(&self, operation: &'static str, document: Document) -> RepositoryResult<T> {
        T::decode(document)
            .map_err(|e| RepositoryError::persistence(operation, self.collection_name(), e))
    }

    fn encode(&self, operation: &'static str, entity: &T) -> RepositoryResult<Document> {
        entity
            .encode()
            .map_err(|e| RepositoryError::persistence(operation, self.collection_name(), e))
    }

    /// Inserts `entity` with fresh timestamps and returns what the server assigned.
    #[instrument(skip(self, ctx, entity), fields(collection = %self.collection_name()))]
    pub async fn create(&self, ctx: &OperationContext, entity: &T) -> RepositoryResult<Inserted> {
        let mut document = self.encode("create", entity)?;
        let now = DateTime::now();
        document.insert(CREATED_AT_FIELD, now);
        document.insert(UPDATED_AT_FIELD, now);

        let result = self
            .execute(ctx, "create", self.collection.insert_one(document))
            .await?;

        let id = result.inserted_id.as_object_id().ok_or_else(|| {
            RepositoryError::persistence(
                "create",
                self.collection_name(),
                format!("server returned non-ObjectId identity {}", result.inserted_id),
            )
        })?;

        debug!(id = %id, "Document inserted");
        Ok(Inserted { id, created_at: now })
    }

    #[instrument(skip(self, ctx), fields(collection = %self.collection_name()))]
    pub async fn find_by_id(&self, ctx: &OperationContext, id: &str) -> RepositoryResult<T> {
        let oid = parse_id(id)?;

        let document = self
            .execute(ctx, "find_by_id", self.collection.find_one(doc! { "_id": oid }))
            .await?
            .ok_or_else(|| RepositoryError::not_found(self.collection_name(), format!("_id={}", oid)))?;

        self.decode("find_by_id", document)
    }

    /// One page of documents ordered by identity. `page` is 1-based.
    ///
    /// Inputs are used as given; callers normalize them.
    #[instrument(skip(self, ctx), fields(collection = %self.collection_name()))]
    pub async fn find_all(
        &self,
        ctx: &OperationContext,
        page: u64,
        limit: u64,
    ) -> RepositoryResult<Vec<T>> {
        // The server treats a zero limit as "no limit".
        if limit == 0 {
            ctx.check()
                .map_err(|reason| RepositoryError::interrupted("find_all", self.collection_name(), reason))?;
            return Ok(Vec::new());
        }

        let options = FindOptions::builder()
            .sort(doc! { "_id": 1 })
            .skip(page_offset(page, limit))
            .limit(i64::try_from(limit).unwrap_or(i64::MAX))
            .build();

        let documents: Vec<Document> = self
            .execute(ctx, "find_all", async {
                let cursor = self.collection.find(doc! {}).with_options(options).await?;
                cursor.try_collect::<Vec<Document>>().await
            })
            .await?;

        documents
            .into_iter()
            .map(|document| self.decode("find_all", document))
            .collect()
    }

    /// Overwrites the client-controlled fields of `id` and refreshes its update stamp.
    #[instrument(skip(self, ctx, entity), fields(collection = %self.collection_name()))]
    pub async fn update(&self, ctx: &OperationContext, id: &str, entity: &T) -> RepositoryResult<()> {
        let oid = parse_id(id)?;
        let mut changes = self.encode("update", entity)?;
        changes.insert(UPDATED_AT_FIELD, DateTime::now());

        let result = self
            .execute(
                ctx,
                "update",
                self.collection
                    .update_one(doc! { "_id": oid }, doc! { "$set": changes }),
            )
            .await?;

        if result.matched_count == 0 {
            return Err(RepositoryError::not_found(
                self.collection_name(),
                format!("_id={}", oid),
            ));
        }
        Ok(())
    }

    /// Removes `id`. Deleting a missing document succeeds.
    #[instrument(skip(self, ctx), fields(collection = %self.collection_name()))]
    pub async fn delete(&self, ctx: &OperationContext, id: &str) -> RepositoryResult<()> {
        let oid = parse_id(id)?;

        let result = self
            .execute(ctx, "delete", self.collection.delete_one(doc! { "_id": oid }))
            .await?;

        if result.deleted_count == 0 {
            debug!(id = %oid, "Delete matched no document");
        }
        Ok(())
    }

    #[instrument(skip(self, ctx), fields(collection = %self.collection_name()))]
    pub async fn count(&self, ctx: &OperationContext) -> RepositoryResult<u64> {
        self.execute(ctx, "count", self.collection.count_documents(doc! {}))
            .await
    }

    /// First document matching `filter`, if any.
    #[instrument(skip(self, ctx), fields(collection = %self.collection_name()))]
    pub async fn find_one(
        &self,
        ctx: &OperationContext,
        operation: &'static str,
        filter: Document,
    ) -> RepositoryResult<Option<T>> {
        self.execute(ctx, operation, self.collection.find_one(filter))
            .await?
            .map(|document| self.decode(operation, document))
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::ContextError;
    use mongodb::Client;
    use serde::Deserialize;
    use std::time::Duration;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Widget {
        #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
        id: Option<ObjectId>,
        label: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        date_created: Option<DateTime>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        updated_created: Option<DateTime>,
    }

    impl Entity for Widget {}

    async fn offline_repository() -> MongoRepository<Widget> {
        let client = Client::with_uri_str("mongodb://127.0.0.1:1").await.unwrap();
        let store = DocumentStore::from_client(client, "repository_test");
        MongoRepository::new(&store, "widgets")
    }

    #[test]
    fn test_encode_strips_server_assigned_fields() {
        let widget = Widget {
            id: Some(ObjectId::new()),
            label: "gear".to_string(),
            date_created: Some(DateTime::now()),
            updated_created: Some(DateTime::now()),
        };

        let document = widget.encode().unwrap();
        assert_eq!(document, doc! { "label": "gear" });
    }

    #[test]
    fn test_decode_reads_identity_and_timestamps() {
        let oid = ObjectId::new();
        let now = DateTime::now();
        let widget = Widget::decode(doc! {
            "_id": oid,
            "label": "gear",
            "date_created": now,
            "updated_created": now,
        })
        .unwrap();

        assert_eq!(widget.id, Some(oid));
        assert_eq!(widget.date_created, Some(now));
    }

    #[test]
    fn test_parse_id() {
        let oid = ObjectId::new();
        assert_eq!(parse_id(&oid.to_hex()).unwrap(), oid);
        assert_eq!(parse_id(&format!(" {} ", oid.to_hex())).unwrap(), oid);
        assert!(matches!(
            parse_id("not-an-id"),
            Err(RepositoryError::InvalidIdentity(ref raw)) if raw == "not-an-id"
        ));
        assert!(parse_id("").is_err());
    }

    #[test]
    fn test_page_offset() {
        assert_eq!(page_offset(1, 10), 0);
        assert_eq!(page_offset(0, 10), 0);
        assert_eq!(page_offset(3, 10), 20);
        assert_eq!(page_offset(i64::MAX as u64, 100), i64::MAX as u64);
        assert_eq!(page_offset(u64::MAX, u64::MAX), i64::MAX as u64);
    }

    #[tokio::test]
    async fn test_malformed_id_fails_before_io() {
        let repo = offline_repository().await;
        let ctx = OperationContext::background();

        // The host is unreachable, so reaching the driver would surface Persistence.
        assert!(matches!(
            repo.find_by_id(&ctx, "xyz").await,
            Err(RepositoryError::InvalidIdentity(_))
        ));
        assert!(matches!(
            repo.delete(&ctx, "xyz").await,
            Err(RepositoryError::InvalidIdentity(_))
        ));

        let widget = Widget {
            id: None,
            label: "gear".to_string(),
            date_created: None,
            updated_created: None,
        };
        assert!(matches!(
            repo.update(&ctx, "xyz", &widget).await,
            Err(RepositoryError::InvalidIdentity(ref raw)) if raw == "xyz"
        ));
    }

    #[tokio::test]
    async fn test_canceled_context_short_circuits() {
        let repo = offline_repository().await;
        let ctx = OperationContext::background();
        ctx.cancel();

        let err = repo.count(&ctx).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Canceled { operation: "count", .. }));
    }

    #[tokio::test]
    async fn test_deadline_surfaces_as_deadline_exceeded() {
        let repo = offline_repository().await;
        let ctx = OperationContext::with_timeout(Duration::from_millis(50));

        let err = repo.count(&ctx).await.unwrap_err();
        assert!(matches!(err, RepositoryError::DeadlineExceeded { .. }));
    }

    #[tokio::test]
    async fn test_zero_limit_returns_empty_page() {
        let repo = offline_repository().await;
        let ctx = OperationContext::background();
        assert!(repo.find_all(&ctx, 1, 0).await.unwrap().is_empty());

        ctx.cancel();
        assert!(matches!(
            repo.find_all(&ctx, 1, 0).await,
            Err(RepositoryError::Canceled { .. })
        ));
        assert_eq!(ctx.check(), Err(ContextError::Canceled));
    }
}
