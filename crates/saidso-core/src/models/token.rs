//! Bearer token domain model.
//!
//! Tokens are opaque: the plaintext secret is returned exactly once at
//! issuance and only its SHA-256 digest is persisted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Capability granted to API access tokens.
pub const CAP_ACCESS_API: &str = "access-api";
/// Capability granted to refresh tokens.
pub const CAP_ISSUE_ACCESS_TOKEN: &str = "issue-access-token";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TokenKind {
    Access,
    Refresh,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: TokenKind,
    /// Labels restricting which operations this token may authorize.
    pub capabilities: Vec<String>,
    /// SHA-256 hex digest of the plaintext secret.
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Token {
    pub fn has_capability(&self, capability: &str) -> bool {
        self.capabilities.iter().any(|c| c == capability)
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateToken {
    pub user_id: Uuid,
    pub kind: TokenKind,
    pub capabilities: Vec<String>,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
}
