//! Request extractors: validated JSON bodies, bearer-authenticated
//! users, and client metadata for device bookkeeping.

use axum::RequestPartsExt;
use axum::extract::{ConnectInfo, FromRef, FromRequest, FromRequestParts, Request};
use axum::http::HeaderMap;
use axum::http::request::Parts;
use axum_extra::TypedHeader;
use axum_extra::headers::{Authorization, UserAgent, authorization::Bearer};
use saidso_core::models::token::{CAP_ACCESS_API, Token};
use saidso_core::models::user::User;
use saidso_core::repository::UserRepository;
use serde::de::DeserializeOwned;
use std::net::SocketAddr;
use validator::Validate;

use crate::error::ApiError;
use crate::state::AppState;

/// JSON body extractor that runs `validator` rules after
/// deserialization.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let axum::Json(inner) = axum::Json::<T>::from_request(req, state).await?;
        inner.validate()?;

        Ok(ValidatedJson(inner))
    }
}

/// The caller behind a valid `access-api` bearer token.
///
/// Extraction resolves the presented secret against the token store
/// and loads the owning user; expired rows are dropped by the lookup.
pub struct AuthenticatedUser {
    pub user: User,
    pub token: Token,
}

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);

        let TypedHeader(Authorization(bearer)) = parts
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
            .map_err(|_| ApiError::MissingBearer)?;

        let token = state
            .issuer
            .validate_capability(bearer.token(), CAP_ACCESS_API)
            .await?;
        let user = state.users.get_by_id(token.user_id).await.map_err(|_| {
            ApiError::Auth(saidso_auth::AuthError::TokenInvalid(
                "token owner no longer exists".into(),
            ))
        })?;

        Ok(AuthenticatedUser { user, token })
    }
}

/// The raw bearer secret, for endpoints that consume it themselves
/// (refresh rotation presents the refresh token here).
pub struct BearerSecret(pub String);

impl<S> FromRequestParts<S> for BearerSecret
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) = parts
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
            .map_err(|_| ApiError::MissingBearer)?;

        Ok(BearerSecret(bearer.token().to_string()))
    }
}

/// Client ip + user agent for the device recorder. Never rejects.
#[derive(Debug, Clone)]
pub struct ClientMeta {
    pub ip: String,
    pub user_agent: Option<String>,
}

fn ip_from_headers(headers: &HeaderMap) -> Option<String> {
    // Proxy headers first, then the socket peer address.
    if let Some(forwarded) = headers.get("X-Forwarded-For")
        && let Ok(s) = forwarded.to_str()
        && let Some(first) = s.split(',').next()
    {
        let first = first.trim();
        if !first.is_empty() {
            return Some(first.to_string());
        }
    }
    if let Some(real_ip) = headers.get("X-Real-IP")
        && let Ok(s) = real_ip.to_str()
    {
        return Some(s.to_string());
    }
    None
}

impl<S> FromRequestParts<S> for ClientMeta
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let ip = ip_from_headers(&parts.headers)
            .or_else(|| {
                parts
                    .extensions
                    .get::<ConnectInfo<SocketAddr>>()
                    .map(|ConnectInfo(addr)| addr.ip().to_string())
            })
            .unwrap_or_else(|| "unknown".to_string());

        let user_agent = parts
            .extract::<Option<TypedHeader<UserAgent>>>()
            .await
            .ok()
            .flatten()
            .map(|TypedHeader(ua)| ua.to_string());

        Ok(ClientMeta { ip, user_agent })
    }
}
