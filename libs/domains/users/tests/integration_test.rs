//! Integration tests for Users domain
//!
//! These tests use real MongoDB via testcontainers to ensure:
//! - Documents round-trip through the generic repository
//! - Pagination is bounded and pages do not overlap
//! - Lookups by email bypass pagination
//! - Deletes are idempotent
//!
//! Run with `cargo test -- --ignored` on a machine with Docker.

use bson::oid::ObjectId;
use database::OperationContext;
use domain_users::*;
use std::collections::HashSet;
use std::time::Duration;
use test_utils::{TestDataBuilder, TestMongo, assertions::*};

fn ctx() -> OperationContext {
    OperationContext::with_timeout(Duration::from_secs(10))
}

fn new_user(email: String, name: &str) -> NewUser {
    NewUser {
        email,
        name: name.to_string(),
        password: Some("correct horse battery".to_string()),
    }
}

// ============================================================================
// Repository Tests
// ============================================================================

#[tokio::test]
#[ignore] // Requires Docker
async fn test_create_and_find_by_id_round_trip() {
    let mongo = TestMongo::new().await;
    let builder = TestDataBuilder::from_test_name("create_and_find");
    let store = mongo.store(&builder.database()).await;
    let repo = MongoUserRepository::new(&store);

    let user = User::new(builder.email("ada"), "Ada", "$argon2id$placeholder".to_string());
    let inserted = repo.create(&ctx(), &user).await.unwrap();
    let id = inserted.id_hex();
    assert_object_id(&id, "created id");

    let stored = repo.find_by_id(&ctx(), &id).await.unwrap();
    assert_eq!(stored, inserted);
    assert_eq!(stored.email, user.email);
    assert_eq!(stored.password_hash, user.password_hash);

    let created = assert_some(stored.date_created, "date_created");
    let updated = assert_some(stored.date_updated, "updated_created");
    assert_eq!(updated, created);
}

#[tokio::test]
#[ignore] // Requires Docker
async fn test_find_by_email_after_create() {
    let mongo = TestMongo::new().await;
    let builder = TestDataBuilder::from_test_name("find_by_email");
    let store = mongo.store(&builder.database()).await;
    let repo = MongoUserRepository::new(&store);

    let email = builder.email("grace");
    let id = repo
        .create(&ctx(), &User::new(email.clone(), "Grace", "hash".to_string()))
        .await
        .unwrap()
        .id_hex();

    let found = repo.find_by_email(&ctx(), &email).await.unwrap();
    assert_eq!(found.id_hex(), id);

    let missing = repo.find_by_email(&ctx(), "nobody@example.com").await;
    assert!(matches!(missing, Err(UserError::NotFound(_))));
}

#[tokio::test]
#[ignore] // Requires Docker
async fn test_pages_are_bounded_and_disjoint() {
    let mongo = TestMongo::new().await;
    let builder = TestDataBuilder::from_test_name("pagination");
    let store = mongo.store(&builder.database()).await;
    let repo = MongoUserRepository::new(&store);

    for i in 0..7 {
        let user = User::new(builder.email(&format!("u{}", i)), "Paged", "hash".to_string());
        repo.create(&ctx(), &user).await.unwrap();
    }

    let mut seen = HashSet::new();
    for page in 1..=3 {
        let users = repo.find_all(&ctx(), page, 3).await.unwrap();
        assert!(users.len() <= 3);
        for user in users {
            assert!(seen.insert(user.id_hex()), "page {} repeated a user", page);
        }
    }
    assert_eq!(seen.len(), 7);

    let beyond = repo.find_all(&ctx(), 4, 3).await.unwrap();
    assert!(beyond.is_empty());

    let far_beyond = repo.find_all(&ctx(), i64::MAX as u64, 100).await.unwrap();
    assert!(far_beyond.is_empty());
    assert_eq!(repo.count(&ctx()).await.unwrap(), 7);
}

#[tokio::test]
#[ignore] // Requires Docker
async fn test_delete_then_find_is_not_found() {
    let mongo = TestMongo::new().await;
    let builder = TestDataBuilder::from_test_name("delete");
    let store = mongo.store(&builder.database()).await;
    let repo = MongoUserRepository::new(&store);

    let id = repo
        .create(&ctx(), &User::new(builder.email("gone"), "Gone", "hash".to_string()))
        .await
        .unwrap()
        .id_hex();

    repo.delete(&ctx(), &id).await.unwrap();
    let err = repo.find_by_id(&ctx(), &id).await.unwrap_err();
    assert!(err.is_not_found());

    // A second delete of the same id is still a success
    repo.delete(&ctx(), &id).await.unwrap();
}

#[tokio::test]
#[ignore] // Requires Docker
async fn test_update_refreshes_stamp_and_keeps_identity() {
    let mongo = TestMongo::new().await;
    let builder = TestDataBuilder::from_test_name("update");
    let store = mongo.store(&builder.database()).await;
    let repo = MongoUserRepository::new(&store);

    let id = repo
        .create(&ctx(), &User::new(builder.email("old"), "Old", "hash".to_string()))
        .await
        .unwrap()
        .id_hex();
    let mut user = repo.find_by_id(&ctx(), &id).await.unwrap();

    tokio::time::sleep(Duration::from_millis(5)).await;
    user.name = "New".to_string();
    repo.update(&ctx(), &id, &user).await.unwrap();

    let updated = repo.find_by_id(&ctx(), &id).await.unwrap();
    assert_eq!(updated.name, "New");
    assert_eq!(updated.id, user.id);
    assert_eq!(updated.date_created, user.date_created);
    assert!(updated.date_updated > user.date_updated);
}

#[tokio::test]
#[ignore] // Requires Docker
async fn test_update_of_missing_user_is_not_found() {
    let mongo = TestMongo::new().await;
    let builder = TestDataBuilder::from_test_name("update_missing");
    let store = mongo.store(&builder.database()).await;
    let repo = MongoUserRepository::new(&store);

    let user = User::new(builder.email("ghost"), "Ghost", "hash".to_string());
    let err = repo
        .update(&ctx(), &ObjectId::new().to_hex(), &user)
        .await
        .unwrap_err();
    assert!(matches!(err, UserError::NotFound(_)));

    // Nothing was upserted
    assert_eq!(repo.count(&ctx()).await.unwrap(), 0);
}

#[tokio::test]
#[ignore] // Requires Docker
async fn test_malformed_id_is_invalid_identity() {
    let mongo = TestMongo::new().await;
    let store = mongo.store("malformed_id").await;
    let repo = MongoUserRepository::new(&store);

    let err = repo.find_by_id(&ctx(), "not-a-hex-id").await.unwrap_err();
    assert!(matches!(err, UserError::InvalidIdentity(_)));

    let user = User::new("x@example.com", "X", "hash".to_string());
    let err = repo.update(&ctx(), "not-a-hex-id", &user).await.unwrap_err();
    assert!(matches!(err, UserError::InvalidIdentity(_)));
}

#[tokio::test]
#[ignore] // Requires Docker
async fn test_expired_deadline_is_reported() {
    let mongo = TestMongo::new().await;
    let store = mongo.store("expired_deadline").await;
    let repo = MongoUserRepository::new(&store);

    let ctx = OperationContext::with_timeout(Duration::ZERO);
    let err = repo.count(&ctx).await.unwrap_err();
    assert!(matches!(err, UserError::DeadlineExceeded(_)));
}

// ============================================================================
// Service Tests
// ============================================================================

#[tokio::test]
#[ignore] // Requires Docker
async fn test_service_create_rejects_duplicate_email() {
    let mongo = TestMongo::new().await;
    let builder = TestDataBuilder::from_test_name("service_duplicate");
    let store = mongo.store(&builder.database()).await;
    let service = UserService::new(MongoUserRepository::new(&store));

    let email = builder.email("dup");
    let created = service
        .create(&ctx(), new_user(email.clone(), "First"))
        .await
        .unwrap();
    assert_object_id(&created.id_hex(), "created id");
    assert!(created.password_hash.starts_with("$argon2"));

    let err = service
        .create(&ctx(), new_user(email, "Second"))
        .await
        .unwrap_err();
    assert!(matches!(err, UserError::DuplicateEmail(_)));
    assert_eq!(service.count(&ctx()).await.unwrap(), 1);
}

#[tokio::test]
#[ignore] // Requires Docker
async fn test_service_list_normalizes_inputs() {
    let mongo = TestMongo::new().await;
    let builder = TestDataBuilder::from_test_name("service_list");
    let store = mongo.store(&builder.database()).await;
    let service = UserService::new(MongoUserRepository::new(&store));

    for i in 0..12 {
        service
            .create(&ctx(), new_user(builder.email(&format!("l{}", i)), "Listed"))
            .await
            .unwrap();
    }

    let (users, pagination) = service.list(&ctx(), 0, -5).await.unwrap();
    assert_eq!(users.len(), 10);
    assert_eq!((pagination.page, pagination.limit, pagination.total), (1, 10, 12));

    let (users, _) = service.list(&ctx(), 2, 10).await.unwrap();
    assert_eq!(users.len(), 2);
}

#[tokio::test]
#[ignore] // Requires Docker
async fn test_disconnect_happens_once() {
    let mongo = TestMongo::new().await;
    let store = mongo.store("disconnect_once").await;

    assert!(store.disconnect().await);
    assert!(!store.disconnect().await);
    assert!(store.is_disconnected());
}
