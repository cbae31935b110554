//! Integration tests for the ephemeral credential flows using
//! in-memory SurrealDB.

mod common;

use chrono::{Duration, Utc};
use common::{FailingNotifier, RecordingNotifier, setup_db, test_config};
use saidso_auth::credential::CredentialService;
use saidso_auth::error::AuthError;
use saidso_auth::identity::{IdentityService, RegisterInput};
use saidso_auth::issuer::TokenIssuer;
use saidso_core::models::credential::{CreateCredential, CredentialPurpose};
use saidso_core::models::user::{UpdateUser, User};
use saidso_core::ports::Notification;
use saidso_core::repository::{CredentialRepository, UserRepository};
use saidso_db::repository::{
    SurrealCredentialRepository, SurrealTokenRepository, SurrealUserRepository,
};
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

async fn register_alice(db: &Surreal<Db>) -> User {
    let identity = IdentityService::new(SurrealUserRepository::new(db.clone()), test_config());
    identity
        .register(RegisterInput {
            name: "Alice".into(),
            email: "alice@x.com".into(),
            password: "password1".into(),
            password_confirmation: "password1".into(),
        })
        .await
        .unwrap()
}

#[tokio::test]
async fn verification_credential_is_dispatched_with_link() {
    let db = setup_db().await;
    let notifier = RecordingNotifier::new();
    let svc = CredentialService::new(
        SurrealCredentialRepository::new(db.clone()),
        notifier.clone(),
        test_config(),
    );

    let user = register_alice(&db).await;
    let credential = svc.issue_email_verification(&user).await.unwrap();

    assert_eq!(credential.token.len(), 64);
    assert_eq!(credential.subject, user.id.to_string());
    // 24-hour TTL.
    let ttl = credential.expires_at - credential.created_at;
    assert_eq!(ttl.num_hours(), 24);

    let sent = notifier.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, "alice@x.com");
    match &sent[0].1 {
        Notification::VerifyEmail {
            recipient_name,
            verification_url,
        } => {
            assert_eq!(recipient_name, "Alice");
            assert_eq!(
                verification_url,
                &format!("http://localhost:5173/verify-email/{}", credential.token)
            );
        }
        other => panic!("expected VerifyEmail notification, got {other:?}"),
    }
}

#[tokio::test]
async fn reset_credential_link_embeds_encoded_email() {
    let db = setup_db().await;
    let notifier = RecordingNotifier::new();
    let svc = CredentialService::new(
        SurrealCredentialRepository::new(db),
        notifier.clone(),
        test_config(),
    );

    let credential = svc.issue_password_reset("bob+test@x.com").await.unwrap();
    // 60-minute TTL.
    let ttl = credential.expires_at - credential.created_at;
    assert_eq!(ttl.num_minutes(), 60);

    let sent = notifier.sent();
    assert_eq!(sent.len(), 1);
    match &sent[0].1 {
        Notification::ResetPassword { reset_url } => {
            assert!(reset_url.contains(&credential.token));
            assert!(reset_url.contains("email=bob%2Btest%40x.com"));
        }
        other => panic!("expected ResetPassword notification, got {other:?}"),
    }
}

#[tokio::test]
async fn consumption_is_exactly_once() {
    let db = setup_db().await;
    let svc = CredentialService::new(
        SurrealCredentialRepository::new(db.clone()),
        RecordingNotifier::new(),
        test_config(),
    );

    let user = register_alice(&db).await;
    let credential = svc.issue_email_verification(&user).await.unwrap();

    let consumed = svc
        .consume(&credential.token, CredentialPurpose::VerifyEmail)
        .await
        .unwrap();
    assert_eq!(consumed.subject, user.id.to_string());

    // Double-submit of the same token loses the claim.
    let err = svc
        .consume(&credential.token, CredentialPurpose::VerifyEmail)
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::CredentialInvalid));
}

#[tokio::test]
async fn reissue_invalidates_previous_credential() {
    let db = setup_db().await;
    let svc = CredentialService::new(
        SurrealCredentialRepository::new(db),
        RecordingNotifier::new(),
        test_config(),
    );

    let first = svc.issue_password_reset("carol@x.com").await.unwrap();
    let second = svc.issue_password_reset("carol@x.com").await.unwrap();

    // Only the newest credential is live.
    let err = svc
        .consume(&first.token, CredentialPurpose::ResetPassword)
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::CredentialInvalid));

    assert!(
        svc.consume(&second.token, CredentialPurpose::ResetPassword)
            .await
            .is_ok()
    );
}

#[tokio::test]
async fn expired_credential_is_rejected_and_removed() {
    let db = setup_db().await;
    let repo = SurrealCredentialRepository::new(db.clone());
    let svc = CredentialService::new(
        SurrealCredentialRepository::new(db),
        RecordingNotifier::new(),
        test_config(),
    );

    // Plant a reset credential issued over an hour ago.
    repo.create(CreateCredential {
        token: "stale-reset-token".into(),
        subject: "dave@x.com".into(),
        purpose: CredentialPurpose::ResetPassword,
        expires_at: Utc::now() - Duration::minutes(5),
    })
    .await
    .unwrap();

    let err = svc
        .consume("stale-reset-token", CredentialPurpose::ResetPassword)
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::CredentialExpired));

    // Expiry detection deleted the row.
    let err = svc
        .consume("stale-reset-token", CredentialPurpose::ResetPassword)
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::CredentialInvalid));
}

#[tokio::test]
async fn notifier_failure_surfaces_as_upstream_error() {
    let db = setup_db().await;
    let svc = CredentialService::new(
        SurrealCredentialRepository::new(db),
        FailingNotifier,
        test_config(),
    );

    let err = svc.issue_password_reset("erin@x.com").await.unwrap_err();
    assert!(matches!(
        err,
        AuthError::Core(saidso_core::SaidsoError::Upstream { .. })
    ));
}

#[tokio::test]
async fn verify_email_flow_marks_verified_and_logs_in() {
    let db = setup_db().await;
    let users = SurrealUserRepository::new(db.clone());
    let issuer = TokenIssuer::new(SurrealTokenRepository::new(db.clone()), test_config());
    let svc = CredentialService::new(
        SurrealCredentialRepository::new(db.clone()),
        RecordingNotifier::new(),
        test_config(),
    );

    let user = register_alice(&db).await;
    let credential = svc.issue_email_verification(&user).await.unwrap();

    // The orchestration the verification endpoint performs: consume,
    // stamp verification, issue the auto-login pair.
    let consumed = svc
        .consume(&credential.token, CredentialPurpose::VerifyEmail)
        .await
        .unwrap();
    let subject_id = consumed.subject.parse().unwrap();
    users
        .update(
            subject_id,
            UpdateUser {
                email_verified_at: Some(Utc::now()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let pair = issuer.issue_pair(subject_id).await.unwrap();

    let stored = users.get_by_id(user.id).await.unwrap();
    assert!(stored.email_verified_at.is_some());
    assert!(issuer.validate(&pair.access_token).await.is_ok());
}

#[tokio::test]
async fn reset_password_flow_replaces_hash_and_logs_in() {
    let db = setup_db().await;
    let users = SurrealUserRepository::new(db.clone());
    let identity = IdentityService::new(SurrealUserRepository::new(db.clone()), test_config());
    let svc = CredentialService::new(
        SurrealCredentialRepository::new(db.clone()),
        RecordingNotifier::new(),
        test_config(),
    );

    let user = register_alice(&db).await;
    users
        .update(
            user.id,
            UpdateUser {
                email_verified_at: Some(Utc::now()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let credential = svc.issue_password_reset("alice@x.com").await.unwrap();

    // The orchestration the reset endpoint performs: consume, look up
    // the user by the stored subject email, replace the hash.
    let consumed = svc
        .consume(&credential.token, CredentialPurpose::ResetPassword)
        .await
        .unwrap();
    let target = users.get_by_email(&consumed.subject).await.unwrap();
    users.set_password(target.id, "new-password9").await.unwrap();

    // Old password no longer works, new one does.
    assert!(
        identity
            .resolve_by_password("alice@x.com", "password1")
            .await
            .is_err()
    );
    assert!(
        identity
            .resolve_by_password("alice@x.com", "new-password9")
            .await
            .is_ok()
    );
}
