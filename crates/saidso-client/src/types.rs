//! Wire types shared with the server.

use serde::{Deserialize, Serialize};

/// The stored access + refresh secret pair.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Login-like response body from the API.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    pub user: serde_json::Value,
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds.
    pub expires_in: Option<u64>,
}
