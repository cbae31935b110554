//! Authentication endpoints: registration, login, logout, token
//! refresh, email verification, password reset, and federated login.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Redirect;
use saidso_auth::identity::RegisterInput;
use saidso_core::SaidsoError;
use saidso_core::models::credential::CredentialPurpose;
use saidso_core::models::user::{UpdateUser, User};
use saidso_core::repository::UserRepository;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::error::ApiError;
use crate::extractors::{AuthenticatedUser, BearerSecret, ClientMeta, ValidatedJson};
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterPayload {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8))]
    pub password: String,
    pub password_confirmation: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginPayload {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ForgotPasswordPayload {
    #[validate(email)]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ResetPasswordPayload {
    #[validate(length(min = 1))]
    pub token: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8))]
    pub password: String,
    pub password_confirmation: String,
}

#[derive(Debug, Deserialize)]
pub struct OAuthCallbackParams {
    pub code: String,
}

/// Token-pair response returned by every login-like endpoint.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: User,
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds.
    pub expires_in: u64,
}

impl AppState {
    /// The shared tail of login, refresh, verification, and reset:
    /// mint a pair for `user` and record the device sighting.
    async fn issue_session(
        &self,
        user: User,
        meta: &ClientMeta,
    ) -> Result<AuthResponse, ApiError> {
        let pair = self.issuer.issue_pair(user.id).await?;
        self.devices
            .record(user.id, &meta.ip, meta.user_agent.as_deref())
            .await;

        info!(user = %user.id, device = ?meta.user_agent, "issued token pair");

        Ok(AuthResponse {
            user,
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
            expires_in: pair.expires_in,
        })
    }
}

/// `POST /register`. Creates an unverified account and dispatches
/// the verification email; deliberately does not log the user in.
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<RegisterPayload>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    let user = state
        .identity
        .register(RegisterInput {
            name: payload.name,
            email: payload.email,
            password: payload.password,
            password_confirmation: payload.password_confirmation,
        })
        .await?;

    state.credentials.issue_email_verification(&user).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message":
                "Registration successful! Please check your email to verify your account.",
        })),
    ))
}

/// `POST /login`.
pub async fn login(
    State(state): State<AppState>,
    meta: ClientMeta,
    ValidatedJson(payload): ValidatedJson<LoginPayload>,
) -> Result<Json<AuthResponse>, ApiError> {
    let user = state
        .identity
        .resolve_by_password(&payload.email, &payload.password)
        .await?;

    Ok(Json(state.issue_session(user, &meta).await?))
}

/// `POST /logout`. Revokes only the presented token; the user's
/// other sessions stay valid.
pub async fn logout(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.issuer.revoke(auth.token.id).await?;
    Ok(Json(json!({ "message": "Logged out" })))
}

/// `POST /refresh`. Rotates the presented refresh token into a
/// fresh pair; the consumed token can never be presented again.
pub async fn refresh(
    State(state): State<AppState>,
    meta: ClientMeta,
    BearerSecret(secret): BearerSecret,
) -> Result<Json<AuthResponse>, ApiError> {
    let rotated = state.rotator.rotate(&secret).await?;
    let user = state.users.get_by_id(rotated.user_id).await?;

    state
        .devices
        .record(user.id, &meta.ip, meta.user_agent.as_deref())
        .await;
    info!(user = %user.id, "rotated refresh token");

    Ok(Json(AuthResponse {
        user,
        access_token: rotated.pair.access_token,
        refresh_token: rotated.pair.refresh_token,
        expires_in: rotated.pair.expires_in,
    }))
}

/// `GET /user`.
pub async fn current_user(auth: AuthenticatedUser) -> Json<User> {
    Json(auth.user)
}

/// `GET /auth/verify-email/{token}`. Consumes the verification
/// credential, marks the account verified, and logs the user in.
pub async fn verify_email(
    State(state): State<AppState>,
    meta: ClientMeta,
    Path(token): Path<String>,
) -> Result<Json<AuthResponse>, ApiError> {
    let credential = state
        .credentials
        .consume(&token, CredentialPurpose::VerifyEmail)
        .await?;

    let user_id: Uuid = credential
        .subject
        .parse()
        .map_err(|_| ApiError::Core(SaidsoError::Internal("malformed credential subject".into())))?;

    let user = state
        .users
        .update(
            user_id,
            UpdateUser {
                email_verified_at: Some(chrono::Utc::now()),
                ..Default::default()
            },
        )
        .await?;

    Ok(Json(state.issue_session(user, &meta).await?))
}

/// `POST /auth/forgot-password`. Issues a reset credential when the
/// address is registered; the response never discloses whether it is.
pub async fn forgot_password(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<ForgotPasswordPayload>,
) -> Result<Json<serde_json::Value>, ApiError> {
    match state.users.get_by_email(&payload.email).await {
        Ok(_) => {
            state.credentials.issue_password_reset(&payload.email).await?;
        }
        Err(SaidsoError::NotFound { .. }) => {}
        Err(e) => return Err(e.into()),
    }

    Ok(Json(json!({
        "message": "If your email is registered, you will receive a password reset link.",
    })))
}

/// `POST /auth/reset-password`. Consumes the reset credential, sets
/// the new password, and logs the user in.
pub async fn reset_password(
    State(state): State<AppState>,
    meta: ClientMeta,
    ValidatedJson(payload): ValidatedJson<ResetPasswordPayload>,
) -> Result<Json<AuthResponse>, ApiError> {
    if payload.password != payload.password_confirmation {
        return Err(saidso_auth::AuthError::PasswordMismatch.into());
    }

    let credential = state
        .credentials
        .consume(&payload.token, CredentialPurpose::ResetPassword)
        .await?;

    // The credential is bound to the address it was issued for.
    if credential.subject != payload.email {
        return Err(saidso_auth::AuthError::CredentialInvalid.into());
    }

    let user = state.users.get_by_email(&credential.subject).await?;
    state.users.set_password(user.id, &payload.password).await?;

    Ok(Json(state.issue_session(user, &meta).await?))
}

/// `GET /auth/google`.
pub async fn google_redirect(State(state): State<AppState>) -> Result<Redirect, ApiError> {
    let google = state.google.as_ref().ok_or(ApiError::FederationUnavailable)?;
    Ok(Redirect::temporary(&google.authorize_url()))
}

/// `GET|POST /auth/google/callback`. Exchanges the authorization
/// code, finds-or-links the account, and bounces back to the front
/// end with the pair in the query string.
pub async fn google_callback(
    State(state): State<AppState>,
    meta: ClientMeta,
    Query(params): Query<OAuthCallbackParams>,
) -> Result<Redirect, ApiError> {
    let google = state.google.as_ref().ok_or(ApiError::FederationUnavailable)?;

    let profile = google.exchange_code(&params.code).await?;
    let user = state.identity.resolve_or_link_federated(profile).await?;
    let session = state.issue_session(user, &meta).await?;

    let destination = format!(
        "{}/auth/callback?access_token={}&refresh_token={}",
        state.auth_config.frontend_base_url,
        urlencoding::encode(&session.access_token),
        urlencoding::encode(&session.refresh_token),
    );

    Ok(Redirect::temporary(&destination))
}
