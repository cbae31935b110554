//! Profile completion and update.

use axum::Json;
use axum::extract::State;
use saidso_auth::avatar;
use saidso_core::SaidsoError;
use saidso_core::models::user::{UpdateUser, User};
use saidso_core::repository::UserRepository;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::ApiError;
use crate::extractors::{AuthenticatedUser, ValidatedJson};
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfilePayload {
    #[validate(length(min = 1, max = 20))]
    pub username: String,
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub country: Option<String>,
    /// Existing path/URL or a base64 image data URI.
    pub avatar: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UpdateProfileResponse {
    pub message: String,
    pub user: User,
}

/// `POST /profile/update`. Sets the username (unique), optional name
/// and country, optionally stores a new avatar, and marks the
/// profile completed.
pub async fn update_profile(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    ValidatedJson(payload): ValidatedJson<UpdateProfilePayload>,
) -> Result<Json<UpdateProfileResponse>, ApiError> {
    let user = auth.user;

    // Uniqueness check, skipped when the user keeps their own handle.
    if user.username.as_deref() != Some(payload.username.as_str())
        && state.users.username_exists(&payload.username).await?
    {
        return Err(SaidsoError::AlreadyExists {
            entity: "username".into(),
        }
        .into());
    }

    let avatar_reference = match &payload.avatar {
        Some(input) => avatar::store_avatar(&state.blobs, "avatars", input).await?,
        None => None,
    };

    let updated = state
        .users
        .update(
            user.id,
            UpdateUser {
                username: Some(payload.username),
                name: payload.name,
                country: payload.country.map(Some),
                avatar: avatar_reference.map(Some),
                is_profile_completed: Some(true),
                ..Default::default()
            },
        )
        .await?;

    Ok(Json(UpdateProfileResponse {
        message: "Profile updated successfully".into(),
        user: updated,
    }))
}
