//! Integration tests for the EphemeralCredential repository using
//! in-memory SurrealDB.

use chrono::{Duration, Utc};
use saidso_core::models::credential::{CreateCredential, CredentialPurpose};
use saidso_core::repository::CredentialRepository;
use saidso_db::repository::SurrealCredentialRepository;
use surrealdb::Surreal;
use surrealdb::engine::local::Mem;

async fn setup() -> Surreal<surrealdb::engine::local::Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    saidso_db::run_migrations(&db).await.unwrap();
    db
}

fn reset_credential(token: &str, email: &str) -> CreateCredential {
    CreateCredential {
        token: token.into(),
        subject: email.into(),
        purpose: CredentialPurpose::ResetPassword,
        expires_at: Utc::now() + Duration::minutes(60),
    }
}

#[tokio::test]
async fn create_and_take() {
    let db = setup().await;
    let repo = SurrealCredentialRepository::new(db);

    let created = repo
        .create(reset_credential("tok-1", "alice@example.com"))
        .await
        .unwrap();
    assert_eq!(created.subject, "alice@example.com");
    assert_eq!(created.purpose, CredentialPurpose::ResetPassword);

    let taken = repo
        .take_by_token("tok-1", CredentialPurpose::ResetPassword)
        .await
        .unwrap();
    assert!(taken.is_some());
    assert_eq!(taken.unwrap().id, created.id);
}

#[tokio::test]
async fn take_is_exactly_once() {
    let db = setup().await;
    let repo = SurrealCredentialRepository::new(db);

    repo.create(reset_credential("tok-2", "bob@example.com"))
        .await
        .unwrap();

    let first = repo
        .take_by_token("tok-2", CredentialPurpose::ResetPassword)
        .await
        .unwrap();
    assert!(first.is_some());

    let second = repo
        .take_by_token("tok-2", CredentialPurpose::ResetPassword)
        .await
        .unwrap();
    assert!(second.is_none(), "credential must be consumed exactly once");
}

#[tokio::test]
async fn take_respects_purpose() {
    let db = setup().await;
    let repo = SurrealCredentialRepository::new(db);

    repo.create(reset_credential("tok-3", "carol@example.com"))
        .await
        .unwrap();

    // A reset token must not consume as a verification token.
    let wrong_purpose = repo
        .take_by_token("tok-3", CredentialPurpose::VerifyEmail)
        .await
        .unwrap();
    assert!(wrong_purpose.is_none());

    // Still available for its real purpose.
    let right_purpose = repo
        .take_by_token("tok-3", CredentialPurpose::ResetPassword)
        .await
        .unwrap();
    assert!(right_purpose.is_some());
}

#[tokio::test]
async fn purge_enforces_single_live_credential() {
    let db = setup().await;
    let repo = SurrealCredentialRepository::new(db);

    repo.create(reset_credential("old-token", "dave@example.com"))
        .await
        .unwrap();

    // Issuing anew: purge predecessors, then insert.
    let purged = repo
        .purge("dave@example.com", CredentialPurpose::ResetPassword)
        .await
        .unwrap();
    assert_eq!(purged, 1);
    repo.create(reset_credential("new-token", "dave@example.com"))
        .await
        .unwrap();

    // The first credential is invalidated, the second is live.
    assert!(
        repo.take_by_token("old-token", CredentialPurpose::ResetPassword)
            .await
            .unwrap()
            .is_none()
    );
    assert!(
        repo.take_by_token("new-token", CredentialPurpose::ResetPassword)
            .await
            .unwrap()
            .is_some()
    );
}

#[tokio::test]
async fn purge_is_scoped_to_purpose() {
    let db = setup().await;
    let repo = SurrealCredentialRepository::new(db);
    let user_id = uuid::Uuid::new_v4().to_string();

    repo.create(CreateCredential {
        token: "verify-tok".into(),
        subject: user_id.clone(),
        purpose: CredentialPurpose::VerifyEmail,
        expires_at: Utc::now() + Duration::hours(24),
    })
    .await
    .unwrap();

    let purged = repo
        .purge(&user_id, CredentialPurpose::ResetPassword)
        .await
        .unwrap();
    assert_eq!(purged, 0);

    assert!(
        repo.take_by_token("verify-tok", CredentialPurpose::VerifyEmail)
            .await
            .unwrap()
            .is_some()
    );
}

#[tokio::test]
async fn delete_expired_removes_stale_rows() {
    let db = setup().await;
    let repo = SurrealCredentialRepository::new(db);

    repo.create(CreateCredential {
        token: "stale-tok".into(),
        subject: "eve@example.com".into(),
        purpose: CredentialPurpose::ResetPassword,
        expires_at: Utc::now() - Duration::minutes(1),
    })
    .await
    .unwrap();
    repo.create(reset_credential("live-tok", "eve@example.com"))
        .await
        .unwrap();

    let dropped = repo.delete_expired().await.unwrap();
    assert_eq!(dropped, 1);

    assert!(
        repo.take_by_token("stale-tok", CredentialPurpose::ResetPassword)
            .await
            .unwrap()
            .is_none()
    );
    assert!(
        repo.take_by_token("live-tok", CredentialPurpose::ResetPassword)
            .await
            .unwrap()
            .is_some()
    );
}
