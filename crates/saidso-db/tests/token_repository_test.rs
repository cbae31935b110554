//! Integration tests for the Token repository using in-memory SurrealDB.

use chrono::{Duration, Utc};
use saidso_core::models::token::{
    CAP_ACCESS_API, CAP_ISSUE_ACCESS_TOKEN, CreateToken, TokenKind,
};
use saidso_core::repository::TokenRepository;
use saidso_db::repository::SurrealTokenRepository;
use surrealdb::Surreal;
use surrealdb::engine::local::Mem;
use uuid::Uuid;

async fn setup() -> Surreal<surrealdb::engine::local::Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    saidso_db::run_migrations(&db).await.unwrap();
    db
}

fn refresh_token(user_id: Uuid, hash: &str) -> CreateToken {
    CreateToken {
        user_id,
        kind: TokenKind::Refresh,
        capabilities: vec![CAP_ISSUE_ACCESS_TOKEN.to_string()],
        token_hash: hash.into(),
        expires_at: Utc::now() + Duration::minutes(20),
    }
}

#[tokio::test]
async fn create_and_get_by_hash() {
    let db = setup().await;
    let repo = SurrealTokenRepository::new(db);
    let user_id = Uuid::new_v4();

    let token = repo
        .create(CreateToken {
            user_id,
            kind: TokenKind::Access,
            capabilities: vec![CAP_ACCESS_API.to_string()],
            token_hash: "digest-a".into(),
            expires_at: Utc::now() + Duration::minutes(3),
        })
        .await
        .unwrap();

    assert_eq!(token.user_id, user_id);
    assert_eq!(token.kind, TokenKind::Access);
    assert!(token.has_capability(CAP_ACCESS_API));
    assert!(!token.has_capability(CAP_ISSUE_ACCESS_TOKEN));

    let fetched = repo.get_by_hash("digest-a").await.unwrap();
    assert_eq!(fetched.id, token.id);
}

#[tokio::test]
async fn get_unknown_hash_fails() {
    let db = setup().await;
    let repo = SurrealTokenRepository::new(db);

    assert!(repo.get_by_hash("no-such-digest").await.is_err());
}

#[tokio::test]
async fn take_by_hash_is_one_shot() {
    let db = setup().await;
    let repo = SurrealTokenRepository::new(db);

    repo.create(refresh_token(Uuid::new_v4(), "digest-b"))
        .await
        .unwrap();

    // First take observes the row.
    let taken = repo.take_by_hash("digest-b").await.unwrap();
    assert!(taken.is_some());
    assert_eq!(taken.unwrap().token_hash, "digest-b");

    // Second take of the same digest observes nothing.
    let again = repo.take_by_hash("digest-b").await.unwrap();
    assert!(again.is_none());

    // The row really is gone.
    assert!(repo.get_by_hash("digest-b").await.is_err());
}

#[tokio::test]
async fn delete_is_idempotent() {
    let db = setup().await;
    let repo = SurrealTokenRepository::new(db);

    let token = repo
        .create(refresh_token(Uuid::new_v4(), "digest-c"))
        .await
        .unwrap();

    repo.delete(token.id).await.unwrap();
    // Deleting an already-deleted token must not error.
    repo.delete(token.id).await.unwrap();

    assert!(repo.get_by_hash("digest-c").await.is_err());
}

#[tokio::test]
async fn delete_expired_removes_only_stale_rows() {
    let db = setup().await;
    let repo = SurrealTokenRepository::new(db);
    let user_id = Uuid::new_v4();

    repo.create(CreateToken {
        user_id,
        kind: TokenKind::Access,
        capabilities: vec![CAP_ACCESS_API.to_string()],
        token_hash: "stale".into(),
        expires_at: Utc::now() - Duration::minutes(1),
    })
    .await
    .unwrap();
    repo.create(refresh_token(user_id, "fresh")).await.unwrap();

    let dropped = repo.delete_expired().await.unwrap();
    assert_eq!(dropped, 1);

    assert!(repo.get_by_hash("stale").await.is_err());
    assert!(repo.get_by_hash("fresh").await.is_ok());
}

#[tokio::test]
async fn per_user_tokens_are_independent() {
    let db = setup().await;
    let repo = SurrealTokenRepository::new(db);
    let user_id = Uuid::new_v4();

    let first = repo
        .create(refresh_token(user_id, "device-one"))
        .await
        .unwrap();
    repo.create(refresh_token(user_id, "device-two"))
        .await
        .unwrap();

    // Revoking one session must not affect the other.
    repo.delete(first.id).await.unwrap();

    assert!(repo.get_by_hash("device-one").await.is_err());
    assert!(repo.get_by_hash("device-two").await.is_ok());
}
