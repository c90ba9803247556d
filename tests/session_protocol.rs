//! Session protocol scenarios against the in-memory store

use std::sync::Arc;

use chrono::{Duration, Utc};
use session_gate::auth::verify_access_token;
use session_gate::error::AuthError;
use session_gate::session::{Credentials, SessionConfig, SessionProtocol};
use session_gate::store::{InMemoryStore, RefreshTokenStore};
use uuid::Uuid;

const SIGNING_KEY: &[u8] = b"integration-test-signing-key";

pub struct TestSession {
    pub protocol: SessionProtocol,
    pub store: InMemoryStore,
}

fn spawn_session() -> TestSession {
    let store = InMemoryStore::new();
    let shared = Arc::new(store.clone());
    let protocol = SessionProtocol::new(SessionConfig::new(SIGNING_KEY), shared.clone(), shared);

    TestSession { protocol, store }
}

fn credentials(email: &str, password: &str) -> Credentials {
    Credentials {
        email: email.to_string(),
        password: password.to_string(),
    }
}

fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}

#[tokio::test]
async fn login_issues_verifiable_access_token_and_persisted_refresh_token() {
    let app = spawn_session();
    let principal = app
        .protocol
        .register(credentials("a@b.com", "ab12"))
        .await
        .expect("Failed to register");

    let now = Utc::now();
    let outcome = app
        .protocol
        .login(credentials("a@b.com", "ab12"), now)
        .await
        .expect("Failed to log in");

    assert_eq!(outcome.user_id, principal.id);
    assert_eq!(
        verify_access_token(&outcome.access_token, SIGNING_KEY).unwrap(),
        principal.id
    );

    assert_eq!(outcome.refresh_token.len(), 64);
    let record = app
        .store
        .refresh_token(&outcome.refresh_token)
        .await
        .expect("Refresh token was not persisted");
    assert_eq!(record.user_id, principal.id);
    assert_eq!(record.expires_at, now + Duration::hours(1440));
    assert!(record.revoked_at.is_none());
}

#[tokio::test]
async fn each_login_persists_a_new_refresh_token() {
    let app = spawn_session();
    let principal = app
        .protocol
        .register(credentials("multi@device.com", "pass12"))
        .await
        .unwrap();

    let first = app
        .protocol
        .login(credentials("multi@device.com", "pass12"), Utc::now())
        .await
        .unwrap();
    let second = app
        .protocol
        .login(credentials("multi@device.com", "pass12"), Utc::now())
        .await
        .unwrap();

    assert_ne!(first.refresh_token, second.refresh_token);
    assert_eq!(app.store.refresh_tokens_for(principal.id).await.len(), 2);
}

#[tokio::test]
async fn login_failures_are_indistinguishable_outward() {
    let app = spawn_session();
    app.protocol
        .register(credentials("a@b.com", "ab12"))
        .await
        .unwrap();

    let wrong_password = app
        .protocol
        .login(credentials("a@b.com", "ab12x"), Utc::now())
        .await
        .unwrap_err();
    let unknown_email = app
        .protocol
        .login(credentials("z@b.com", "ab12"), Utc::now())
        .await
        .unwrap_err();

    assert!(matches!(wrong_password, AuthError::CredentialMismatch));
    assert!(matches!(unknown_email, AuthError::PrincipalNotFound));
    assert_eq!(wrong_password.code(), unknown_email.code());
    assert_eq!(wrong_password.public_message(), unknown_email.public_message());
}

#[tokio::test]
async fn register_rejects_weak_password_and_duplicates() {
    let app = spawn_session();

    let weak = app
        .protocol
        .register(credentials("a@b.com", "abc1"))
        .await
        .unwrap_err();
    assert!(matches!(weak, AuthError::WeakCredential(_)));

    app.protocol
        .register(credentials("a@b.com", "ab12"))
        .await
        .unwrap();
    let duplicate = app
        .protocol
        .register(credentials("a@b.com", "cd34"))
        .await
        .unwrap_err();
    assert!(matches!(duplicate, AuthError::DuplicatePrincipal));
}

#[tokio::test]
async fn refresh_with_expired_token_fails() {
    let app = spawn_session();
    let now = Utc::now();
    RefreshTokenStore::insert(&app.store, "expired-token", Uuid::new_v4(), now - Duration::hours(1))
        .await
        .unwrap();

    let result = app
        .protocol
        .refresh(Some(bearer("expired-token").as_str()), now)
        .await;

    assert!(matches!(result, Err(AuthError::InvalidRefreshToken)));
}

#[tokio::test]
async fn refresh_after_revoke_fails() {
    let app = spawn_session();
    app.protocol
        .register(credentials("a@b.com", "ab12"))
        .await
        .unwrap();
    let outcome = app
        .protocol
        .login(credentials("a@b.com", "ab12"), Utc::now())
        .await
        .unwrap();
    let header = bearer(&outcome.refresh_token);

    app.protocol
        .refresh(Some(header.as_str()), Utc::now())
        .await
        .expect("Valid token should refresh");

    app.protocol
        .revoke(Some(header.as_str()), Utc::now())
        .await
        .expect("Failed to revoke");

    let result = app.protocol.refresh(Some(header.as_str()), Utc::now()).await;
    assert!(matches!(result, Err(AuthError::InvalidRefreshToken)));

    let record = app.store.refresh_token(&outcome.refresh_token).await.unwrap();
    assert!(record.revoked_at.is_some());
}

#[tokio::test]
async fn refresh_does_not_rotate_the_refresh_token() {
    let app = spawn_session();
    let owner = Uuid::new_v4();
    let now = Utc::now();
    RefreshTokenStore::insert(&app.store, "long-lived", owner, now + Duration::hours(1))
        .await
        .unwrap();
    let header = bearer("long-lived");

    // Claims carry no nonce, so distinct tokens need distinct issue seconds
    let first = app.protocol.refresh(Some(header.as_str()), now).await.unwrap();
    let second = app
        .protocol
        .refresh(Some(header.as_str()), now + Duration::seconds(1))
        .await
        .unwrap();

    assert_ne!(first, second);
    assert_eq!(verify_access_token(&first, SIGNING_KEY).unwrap(), owner);
    assert_eq!(verify_access_token(&second, SIGNING_KEY).unwrap(), owner);
    assert!(app.store.refresh_token("long-lived").await.unwrap().revoked_at.is_none());
}

#[tokio::test]
async fn revoke_is_idempotent_and_needs_no_existing_token() {
    let app = spawn_session();
    let header = bearer("never-issued");

    assert!(app.protocol.revoke(Some(header.as_str()), Utc::now()).await.is_ok());
    assert!(app.protocol.revoke(Some(header.as_str()), Utc::now()).await.is_ok());
}

#[tokio::test]
async fn revoke_keeps_the_first_revocation_time() {
    let app = spawn_session();
    let now = Utc::now();
    RefreshTokenStore::insert(&app.store, "tok", Uuid::new_v4(), now + Duration::hours(1))
        .await
        .unwrap();

    app.protocol.revoke(Some(bearer("tok").as_str()), now).await.unwrap();
    app.protocol
        .revoke(Some(bearer("tok").as_str()), now + Duration::minutes(1))
        .await
        .unwrap();

    assert_eq!(
        app.store.refresh_token("tok").await.unwrap().revoked_at,
        Some(now)
    );
}

#[tokio::test]
async fn concurrent_refreshes_of_one_token_both_succeed() {
    let app = spawn_session();
    let owner = Uuid::new_v4();
    let now = Utc::now();
    RefreshTokenStore::insert(&app.store, "shared", owner, now + Duration::hours(1))
        .await
        .unwrap();

    let header = bearer("shared");
    let (a, b) = tokio::join!(
        app.protocol.refresh(Some(header.as_str()), now),
        app.protocol.refresh(Some(header.as_str()), now),
    );

    let (a, b) = (a.unwrap(), b.unwrap());
    assert_eq!(verify_access_token(&a, SIGNING_KEY).unwrap(), owner);
    assert_eq!(verify_access_token(&b, SIGNING_KEY).unwrap(), owner);
    // Same subject and issue second sign to the same token
    assert_eq!(a, b);
}

#[tokio::test]
async fn revocation_does_not_invalidate_issued_access_tokens() {
    let app = spawn_session();
    let owner = Uuid::new_v4();
    let now = Utc::now();
    RefreshTokenStore::insert(&app.store, "tok", owner, now + Duration::hours(1))
        .await
        .unwrap();

    let access_token = app.protocol.refresh(Some(bearer("tok").as_str()), now).await.unwrap();
    app.protocol.revoke(Some(bearer("tok").as_str()), now).await.unwrap();

    assert_eq!(
        app.protocol.authenticate(Some(bearer(&access_token).as_str())).unwrap(),
        owner
    );
}
