//! User domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How the account authenticates.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum LoginMethod {
    /// Email + password credentials.
    Password,
    /// External identity provider (Google).
    Federated,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    /// Absent for federated accounts that never set a password.
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    /// Unique handle, at most 20 characters. Unset until the profile
    /// is completed (or generated at federated signup).
    pub username: Option<String>,
    pub name: String,
    pub country: Option<String>,
    /// Opaque blob-store reference or external URL.
    pub avatar: Option<String>,
    pub email_verified_at: Option<DateTime<Utc>>,
    pub login_method: LoginMethod,
    /// External provider subject id; unique when present.
    pub federated_id: Option<String>,
    pub last_login_at: Option<DateTime<Utc>>,
    pub is_profile_completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn is_verified(&self) -> bool {
        self.email_verified_at.is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    pub email: String,
    pub name: String,
    /// Raw password, hashed with Argon2id before storage. `None` for
    /// federated accounts.
    pub password: Option<String>,
    pub username: Option<String>,
    pub avatar: Option<String>,
    pub login_method: LoginMethod,
    pub federated_id: Option<String>,
    /// Federated signups arrive pre-verified.
    pub email_verified_at: Option<DateTime<Utc>>,
}

/// Partial update. `Some(Some(v))` sets a nullable field, `Some(None)`
/// clears it, `None` leaves it untouched.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateUser {
    pub username: Option<String>,
    pub name: Option<String>,
    pub country: Option<Option<String>>,
    pub avatar: Option<Option<String>>,
    pub email_verified_at: Option<DateTime<Utc>>,
    pub login_method: Option<LoginMethod>,
    pub federated_id: Option<String>,
    pub last_login_at: Option<DateTime<Utc>>,
    pub is_profile_completed: Option<bool>,
}
