//! Session manager tests against a mock identity API.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum::Json;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::routing::{get, post};
use saidso_client::{ClientError, SessionManager};
use serde_json::{Value, json};
use std::sync::Mutex;

/// Mock server state: one live pair, rotated on every refresh.
struct MockApi {
    access: Mutex<String>,
    refresh: Mutex<String>,
    refresh_calls: AtomicUsize,
    counter: AtomicUsize,
}

impl MockApi {
    fn new() -> Self {
        Self {
            access: Mutex::new("access-0".into()),
            refresh: Mutex::new("refresh-0".into()),
            refresh_calls: AtomicUsize::new(0),
            counter: AtomicUsize::new(0),
        }
    }

    /// Simulate access-token expiry: the served token changes, so the
    /// client's stored one stops matching.
    fn expire_access(&self) {
        *self.access.lock().unwrap() = "server-side-expired".into();
    }

    /// Simulate refresh-token revocation.
    fn revoke_refresh(&self) {
        *self.refresh.lock().unwrap() = "server-side-revoked".into();
    }

    fn rotate(&self) -> (String, String) {
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        let access = format!("access-{n}");
        let refresh = format!("refresh-{n}");
        *self.access.lock().unwrap() = access.clone();
        *self.refresh.lock().unwrap() = refresh.clone();
        (access, refresh)
    }
}

fn bearer(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string)
}

fn pair_body(access: &str, refresh: &str) -> Json<Value> {
    Json(json!({
        "user": { "email": "alice@x.com" },
        "access_token": access,
        "refresh_token": refresh,
        "expires_in": 180,
    }))
}

async fn mock_login(State(api): State<Arc<MockApi>>) -> Json<Value> {
    let (access, refresh) = api.rotate();
    pair_body(&access, &refresh)
}

async fn mock_register() -> (StatusCode, Json<Value>) {
    (
        StatusCode::CREATED,
        Json(json!({ "message": "Registration successful!" })),
    )
}

async fn mock_user(
    State(api): State<Arc<MockApi>>,
    headers: HeaderMap,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let presented = bearer(&headers);
    if presented.as_deref() == Some(api.access.lock().unwrap().as_str()) {
        Ok(Json(json!({ "email": "alice@x.com" })))
    } else {
        Err((
            StatusCode::UNAUTHORIZED,
            Json(json!({ "message": "Unauthenticated." })),
        ))
    }
}

async fn mock_refresh(
    State(api): State<Arc<MockApi>>,
    headers: HeaderMap,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    api.refresh_calls.fetch_add(1, Ordering::SeqCst);

    let presented = bearer(&headers);
    if presented.as_deref() == Some(api.refresh.lock().unwrap().as_str()) {
        let (access, refresh) = api.rotate();
        Ok(pair_body(&access, &refresh))
    } else {
        Err((
            StatusCode::UNAUTHORIZED,
            Json(json!({ "message": "Unauthenticated." })),
        ))
    }
}

async fn mock_logout() -> Json<Value> {
    Json(json!({ "message": "Logged out" }))
}

async fn spawn_mock() -> (String, Arc<MockApi>) {
    let api = Arc::new(MockApi::new());
    let app = axum::Router::new()
        .route("/login", post(mock_login))
        .route("/register", post(mock_register))
        .route("/user", get(mock_user))
        .route("/refresh", post(mock_refresh))
        .route("/logout", post(mock_logout))
        .with_state(api.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{addr}"), api)
}

fn storage_path() -> PathBuf {
    std::env::temp_dir().join(format!("saidso-session-{}.json", uuid::Uuid::new_v4()))
}

#[tokio::test]
async fn attaches_bearer_and_fetches_user() {
    let (base_url, _api) = spawn_mock().await;
    let manager = SessionManager::new(base_url.as_str(), storage_path()).unwrap();

    assert!(!manager.is_authenticated().await);
    let user = manager.login("alice@x.com", "password1").await.unwrap();
    assert_eq!(user["email"], "alice@x.com");
    assert!(manager.is_authenticated().await);

    let fetched = manager.current_user().await.unwrap();
    assert_eq!(fetched["email"], "alice@x.com");
}

#[tokio::test]
async fn register_does_not_store_a_session() {
    let (base_url, _api) = spawn_mock().await;
    let manager = SessionManager::new(base_url.as_str(), storage_path()).unwrap();

    manager
        .register("Alice", "alice@x.com", "password1", "password1")
        .await
        .unwrap();
    assert!(!manager.is_authenticated().await);

    let err = manager.current_user().await.unwrap_err();
    assert!(matches!(err, ClientError::NotAuthenticated));
}

#[tokio::test]
async fn renews_once_on_authorization_failure() {
    let (base_url, api) = spawn_mock().await;
    let manager = SessionManager::new(base_url.as_str(), storage_path()).unwrap();
    manager.login("alice@x.com", "password1").await.unwrap();

    api.expire_access();

    let user = manager.current_user().await.unwrap();
    assert_eq!(user["email"], "alice@x.com");
    assert_eq!(api.refresh_calls.load(Ordering::SeqCst), 1);

    // The renewed pair keeps working without further refreshes.
    manager.current_user().await.unwrap();
    assert_eq!(api.refresh_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn concurrent_failures_share_a_single_renewal() {
    let (base_url, api) = spawn_mock().await;
    let manager = SessionManager::new(base_url.as_str(), storage_path()).unwrap();
    manager.login("alice@x.com", "password1").await.unwrap();

    api.expire_access();

    // Two in-flight calls observe the expired token at the same time.
    // Rotation is one-shot server-side, so only one renewal may be
    // attempted; the loser must reuse the winner's fresh pair.
    let (first, second) = tokio::join!(manager.current_user(), manager.current_user());
    assert!(first.is_ok());
    assert!(second.is_ok());
    assert_eq!(api.refresh_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn renewal_failure_forces_logout() {
    let (base_url, api) = spawn_mock().await;
    let manager = SessionManager::new(base_url.as_str(), storage_path()).unwrap();
    manager.login("alice@x.com", "password1").await.unwrap();

    api.expire_access();
    api.revoke_refresh();

    let err = manager.current_user().await.unwrap_err();
    assert!(matches!(err, ClientError::SessionExpired));
    assert!(!manager.is_authenticated().await);

    // Subsequent calls demand a fresh login rather than looping.
    let err = manager.current_user().await.unwrap_err();
    assert!(matches!(err, ClientError::NotAuthenticated));
}

#[tokio::test]
async fn session_survives_restart() {
    let (base_url, _api) = spawn_mock().await;
    let path = storage_path();

    let manager = SessionManager::new(base_url.as_str(), &path).unwrap();
    manager.login("alice@x.com", "password1").await.unwrap();
    drop(manager);

    // A new manager resumes from the persisted pair.
    let resumed = SessionManager::new(base_url.as_str(), &path).unwrap();
    assert!(resumed.is_authenticated().await);
    let user = resumed.current_user().await.unwrap();
    assert_eq!(user["email"], "alice@x.com");
}

#[tokio::test]
async fn logout_clears_stored_session() {
    let (base_url, _api) = spawn_mock().await;
    let path = storage_path();
    let manager = SessionManager::new(base_url.as_str(), &path).unwrap();
    manager.login("alice@x.com", "password1").await.unwrap();

    manager.logout().await.unwrap();
    assert!(!manager.is_authenticated().await);
    assert!(!path.exists());

    let err = manager.current_user().await.unwrap_err();
    assert!(matches!(err, ClientError::NotAuthenticated));
}
