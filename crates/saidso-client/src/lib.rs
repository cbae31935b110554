//! Saidso Client — session management for consumers of the identity
//! API.
//!
//! Holds the access + refresh pair in durable local storage, attaches
//! the access secret as a bearer credential on every call, and on an
//! authorization failure performs exactly one renewal + retry.
//! Renewal is single-flight: refresh rotation is one-shot on the
//! server, so two concurrent renewals presenting the same refresh
//! token would log the session out — a lock serializes them and the
//! losers reuse the winner's fresh pair.

pub mod error;
pub mod storage;
pub mod types;

use reqwest::{Method, StatusCode};
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, warn};

pub use error::{ClientError, ClientResult};
use storage::SessionStore;
pub use types::TokenPair;
use types::AuthResponse;

pub struct SessionManager {
    base_url: String,
    http: reqwest::Client,
    store: SessionStore,
    session: Mutex<Option<TokenPair>>,
}

impl SessionManager {
    /// Create a manager for the API at `base_url`, resuming any
    /// session persisted at `storage_path`.
    pub fn new(base_url: impl Into<String>, storage_path: impl Into<std::path::PathBuf>) -> ClientResult<Self> {
        let store = SessionStore::new(storage_path);
        let session = store.load()?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
            store,
            session: Mutex::new(session),
        })
    }

    /// Whether a token pair is currently held.
    pub async fn is_authenticated(&self) -> bool {
        self.session.lock().await.is_some()
    }

    // -- public operations ------------------------------------------------

    /// `POST /register`. Registration does not log the user in; the
    /// account must be verified by email first.
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
        password_confirmation: &str,
    ) -> ClientResult<Value> {
        let response = self
            .http
            .post(self.url("/register"))
            .json(&serde_json::json!({
                "name": name,
                "email": email,
                "password": password,
                "password_confirmation": password_confirmation,
            }))
            .send()
            .await?;

        parse_json(response).await
    }

    /// `POST /login`. Stores the returned pair on success.
    pub async fn login(&self, email: &str, password: &str) -> ClientResult<Value> {
        let response = self
            .http
            .post(self.url("/login"))
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await?;

        let auth: AuthResponse = serde_json::from_value(parse_json(response).await?)?;
        self.replace_session(Some(TokenPair {
            access_token: auth.access_token,
            refresh_token: auth.refresh_token,
        }))
        .await?;

        Ok(auth.user)
    }

    /// `POST /logout`, then clear the stored pair regardless of the
    /// server's answer.
    pub async fn logout(&self) -> ClientResult<()> {
        let access = self.current_access().await;
        if let Some(access) = access {
            let result = self
                .http
                .post(self.url("/logout"))
                .bearer_auth(&access)
                .send()
                .await;
            if let Err(e) = result {
                warn!(error = %e, "logout request failed; clearing local session anyway");
            }
        }

        self.replace_session(None).await
    }

    /// `GET /user`.
    pub async fn current_user(&self) -> ClientResult<Value> {
        self.authorized(Method::GET, "/user", None).await
    }

    /// `POST /profile/update`.
    pub async fn update_profile(&self, payload: Value) -> ClientResult<Value> {
        self.authorized(Method::POST, "/profile/update", Some(payload))
            .await
    }

    /// Authorized `GET` against an arbitrary API path.
    pub async fn get(&self, path: &str) -> ClientResult<Value> {
        self.authorized(Method::GET, path, None).await
    }

    /// Authorized `POST` against an arbitrary API path.
    pub async fn post(&self, path: &str, body: Value) -> ClientResult<Value> {
        self.authorized(Method::POST, path, Some(body)).await
    }

    // -- internals --------------------------------------------------------

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn current_access(&self) -> Option<String> {
        self.session
            .lock()
            .await
            .as_ref()
            .map(|pair| pair.access_token.clone())
    }

    async fn replace_session(&self, pair: Option<TokenPair>) -> ClientResult<()> {
        let mut guard = self.session.lock().await;
        match &pair {
            Some(pair) => self.store.save(pair)?,
            None => self.store.clear()?,
        }
        *guard = pair;
        Ok(())
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        access: &str,
        body: Option<&Value>,
    ) -> ClientResult<reqwest::Response> {
        let mut request = self
            .http
            .request(method, self.url(path))
            .bearer_auth(access);
        if let Some(body) = body {
            request = request.json(body);
        }
        Ok(request.send().await?)
    }

    /// Issue an authorized call with at most one renewal + retry.
    async fn authorized(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> ClientResult<Value> {
        let access = self
            .current_access()
            .await
            .ok_or(ClientError::NotAuthenticated)?;

        let response = self
            .send(method.clone(), path, &access, body.as_ref())
            .await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return parse_json(response).await;
        }

        debug!(path, "authorization failed; attempting renewal");
        let renewed_access = self.renew(&access).await?;

        let retry = self
            .send(method, path, &renewed_access, body.as_ref())
            .await?;
        if retry.status() == StatusCode::UNAUTHORIZED {
            // One retry per call; a second failure forces logout.
            self.replace_session(None).await?;
            return Err(ClientError::SessionExpired);
        }

        parse_json(retry).await
    }

    /// Renew the pair, serialized across concurrent callers.
    ///
    /// The caller passes the access secret it just presented. If the
    /// stored secret already differs, another caller renewed while we
    /// waited for the lock — reuse its pair instead of presenting the
    /// consumed refresh token again.
    async fn renew(&self, stale_access: &str) -> ClientResult<String> {
        let mut guard = self.session.lock().await;

        let current = guard.clone().ok_or(ClientError::NotAuthenticated)?;
        if current.access_token != stale_access {
            return Ok(current.access_token);
        }

        let response = self
            .http
            .post(self.url("/refresh"))
            .bearer_auth(&current.refresh_token)
            .send()
            .await;

        let renewed = match response {
            Ok(response) if response.status().is_success() => {
                match serde_json::from_value::<AuthResponse>(parse_json(response).await?) {
                    Ok(auth) => Some(TokenPair {
                        access_token: auth.access_token,
                        refresh_token: auth.refresh_token,
                    }),
                    Err(_) => None,
                }
            }
            Ok(response) => {
                warn!(status = %response.status(), "token renewal rejected");
                None
            }
            Err(e) => {
                warn!(error = %e, "token renewal request failed");
                None
            }
        };

        match renewed {
            Some(pair) => {
                self.store.save(&pair)?;
                let access = pair.access_token.clone();
                *guard = Some(pair);
                Ok(access)
            }
            None => {
                // Renewal failure requires re-authentication.
                self.store.clear()?;
                *guard = None;
                Err(ClientError::SessionExpired)
            }
        }
    }
}

async fn parse_json(response: reqwest::Response) -> ClientResult<Value> {
    let status = response.status();
    let body: Value = response.json().await.unwrap_or(Value::Null);

    if status.is_success() {
        Ok(body)
    } else {
        let message = body
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("request failed")
            .to_string();
        Err(ClientError::Api {
            status: status.as_u16(),
            message,
        })
    }
}
