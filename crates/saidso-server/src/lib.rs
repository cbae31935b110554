//! Saidso Server — the HTTP surface over the identity core.

pub mod blob;
pub mod config;
pub mod error;
pub mod extractors;
pub mod google;
pub mod handlers;
pub mod notifier;
pub mod state;

use axum::Router;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the application router.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login))
        .route("/logout", post(handlers::auth::logout))
        .route("/refresh", post(handlers::auth::refresh))
        .route("/user", get(handlers::auth::current_user))
        .route("/profile/update", post(handlers::profile::update_profile))
        .route(
            "/auth/verify-email/{token}",
            get(handlers::auth::verify_email),
        )
        .route(
            "/auth/forgot-password",
            post(handlers::auth::forgot_password),
        )
        .route("/auth/reset-password", post(handlers::auth::reset_password))
        .route("/auth/google", get(handlers::auth::google_redirect))
        .route(
            "/auth/google/callback",
            get(handlers::auth::google_callback).post(handlers::auth::google_callback),
        )
        .fallback(handler_404)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn handler_404() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        axum::Json(serde_json::json!({ "message": "Not found." })),
    )
}
