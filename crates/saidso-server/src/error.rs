//! API error type and HTTP status mapping.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use saidso_auth::AuthError;
use saidso_core::SaidsoError;
use serde_json::json;
use thiserror::Error;
use validator::ValidationErrors;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Core(#[from] SaidsoError),

    #[error("Invalid JSON body: {0}")]
    JsonRejection(#[from] JsonRejection),

    #[error("Invalid request body: {0}")]
    Validation(#[from] ValidationErrors),

    /// Bearer credentials missing or malformed.
    #[error("Missing or malformed bearer token")]
    MissingBearer,

    /// Federated login is not configured on this deployment.
    #[error("Federated login is not configured")]
    FederationUnavailable,
}

/// Response body shape: `{"message": ..., "errors": {field: [msgs]}}`,
/// with `errors` present only for field-mappable failures so the
/// front-end can attach them to inputs.
fn body(message: &str, field: Option<&str>) -> Json<serde_json::Value> {
    match field {
        Some(field) => Json(json!({
            "message": message,
            "errors": { field: [message] },
        })),
        None => Json(json!({ "message": message })),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message, field) = match &self {
            ApiError::Auth(err) => match err {
                // Deliberate registration-status disclosure: the
                // unknown-email case keeps its own message.
                AuthError::EmailNotRegistered => (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "The provided email is not registered.".to_string(),
                    Some("email"),
                ),
                AuthError::EmailNotVerified => (
                    StatusCode::FORBIDDEN,
                    "Please verify your email address.".to_string(),
                    Some("email"),
                ),
                AuthError::InvalidCredentials => (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "Incorrect password.".to_string(),
                    Some("password"),
                ),
                AuthError::PasswordLoginUnavailable => (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "This account uses Google Login.".to_string(),
                    Some("email"),
                ),
                AuthError::TokenExpired | AuthError::TokenInvalid(_) => (
                    StatusCode::UNAUTHORIZED,
                    "Unauthenticated.".to_string(),
                    None,
                ),
                AuthError::InvalidTokenType => (
                    StatusCode::UNAUTHORIZED,
                    "Invalid token type".to_string(),
                    None,
                ),
                AuthError::CredentialInvalid => (
                    StatusCode::BAD_REQUEST,
                    "Invalid token.".to_string(),
                    None,
                ),
                AuthError::CredentialExpired => (
                    StatusCode::BAD_REQUEST,
                    "Token expired.".to_string(),
                    None,
                ),
                AuthError::PasswordTooShort(_) | AuthError::PasswordMismatch => (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    err.to_string(),
                    Some("password"),
                ),
                AuthError::Crypto(_) => {
                    tracing::error!(error = %err, "crypto failure");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "Something went wrong. Please try again later.".to_string(),
                        None,
                    )
                }
                AuthError::Core(inner) => return core_response(inner),
            },
            ApiError::Core(inner) => return core_response(inner),
            ApiError::JsonRejection(e) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                format!("Invalid request body: {e}"),
                None,
            ),
            ApiError::Validation(e) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                format!("Invalid request body: {e}"),
                None,
            ),
            ApiError::MissingBearer => (
                StatusCode::UNAUTHORIZED,
                "Unauthenticated.".to_string(),
                None,
            ),
            ApiError::FederationUnavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                "Federated login is not configured.".to_string(),
                None,
            ),
        };

        (status, body(&message, field)).into_response()
    }
}

fn core_response(err: &SaidsoError) -> Response {
    let (status, message) = match err {
        SaidsoError::NotFound { .. } => (StatusCode::NOT_FOUND, "Not found.".to_string()),
        SaidsoError::AlreadyExists { entity } => (
            StatusCode::CONFLICT,
            format!("This {entity} already exists."),
        ),
        SaidsoError::Validation { message } => {
            (StatusCode::UNPROCESSABLE_ENTITY, message.clone())
        }
        SaidsoError::Unauthorized { .. } => {
            (StatusCode::UNAUTHORIZED, "Unauthenticated.".to_string())
        }
        SaidsoError::Expired { .. } => (StatusCode::BAD_REQUEST, "Token expired.".to_string()),
        SaidsoError::Upstream { service, .. } => {
            tracing::error!(error = %err, service = %service, "upstream failure");
            (
                StatusCode::BAD_GATEWAY,
                "Something went wrong. Please try again later.".to_string(),
            )
        }
        SaidsoError::Database(_) | SaidsoError::Crypto(_) | SaidsoError::Internal(_) => {
            tracing::error!(error = %err, "internal failure");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Something went wrong. Please try again later.".to_string(),
            )
        }
    };

    (status, body(&message, None)).into_response()
}
