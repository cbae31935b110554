//! Ephemeral credential domain model.
//!
//! A single-use, time-boxed secret delivered out-of-band to prove
//! control of an email address. Email verification and password reset
//! share this shape; they differ only in purpose, TTL, and subject.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum CredentialPurpose {
    VerifyEmail,
    ResetPassword,
}

impl CredentialPurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            CredentialPurpose::VerifyEmail => "verify-email",
            CredentialPurpose::ResetPassword => "reset-password",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EphemeralCredential {
    pub id: Uuid,
    /// High-entropy random token value, unique across live credentials.
    pub token: String,
    /// User id for [`CredentialPurpose::VerifyEmail`], email address
    /// for [`CredentialPurpose::ResetPassword`].
    pub subject: String,
    pub purpose: CredentialPurpose,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl EphemeralCredential {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCredential {
    pub token: String,
    pub subject: String,
    pub purpose: CredentialPurpose,
    pub expires_at: DateTime<Utc>,
}
