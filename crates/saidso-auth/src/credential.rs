//! Ephemeral credential issuance and consumption.
//!
//! Email verification and password reset share this lifecycle: a
//! high-entropy single-use token is issued (purging any predecessor
//! for the same subject and purpose), delivered out-of-band, and
//! consumed exactly once.

use chrono::{Duration, Utc};
use saidso_core::models::credential::{CreateCredential, CredentialPurpose, EphemeralCredential};
use saidso_core::models::user::User;
use saidso_core::ports::{Notification, Notifier};
use saidso_core::repository::CredentialRepository;

use crate::config::AuthConfig;
use crate::error::{AuthError, AuthResult};
use crate::token;

#[derive(Clone)]
pub struct CredentialService<C: CredentialRepository, N: Notifier> {
    credentials: C,
    notifier: N,
    config: AuthConfig,
}

impl<C: CredentialRepository, N: Notifier> CredentialService<C, N> {
    pub fn new(credentials: C, notifier: N, config: AuthConfig) -> Self {
        Self {
            credentials,
            notifier,
            config,
        }
    }

    fn ttl_secs(&self, purpose: CredentialPurpose) -> u64 {
        match purpose {
            CredentialPurpose::VerifyEmail => self.config.verify_email_ttl_secs,
            CredentialPurpose::ResetPassword => self.config.reset_password_ttl_secs,
        }
    }

    /// Issue a credential for `(subject, purpose)`, invalidating any
    /// predecessor so at most one is live.
    async fn issue(
        &self,
        subject: String,
        purpose: CredentialPurpose,
    ) -> AuthResult<EphemeralCredential> {
        self.credentials.purge(&subject, purpose).await?;

        let token = token::generate_credential_token(self.config.credential_token_len);
        let ttl = Duration::seconds(self.ttl_secs(purpose) as i64);

        let credential = self
            .credentials
            .create(CreateCredential {
                token,
                subject,
                purpose,
                expires_at: Utc::now() + ttl,
            })
            .await?;

        Ok(credential)
    }

    /// Issue an email-verification credential for `user` and dispatch
    /// the verification email.
    pub async fn issue_email_verification(&self, user: &User) -> AuthResult<EphemeralCredential> {
        let credential = self
            .issue(user.id.to_string(), CredentialPurpose::VerifyEmail)
            .await?;

        let verification_url = format!(
            "{}/verify-email/{}",
            self.config.frontend_base_url, credential.token
        );
        self.notifier
            .send(
                &user.email,
                Notification::VerifyEmail {
                    recipient_name: user.name.clone(),
                    verification_url,
                },
            )
            .await?;

        Ok(credential)
    }

    /// Issue a password-reset credential for `email` and dispatch the
    /// reset email.
    pub async fn issue_password_reset(&self, email: &str) -> AuthResult<EphemeralCredential> {
        let credential = self
            .issue(email.to_string(), CredentialPurpose::ResetPassword)
            .await?;

        let reset_url = format!(
            "{}/reset-password?token={}&email={}",
            self.config.frontend_base_url,
            credential.token,
            urlencoding::encode(email)
        );
        self.notifier
            .send(email, Notification::ResetPassword { reset_url })
            .await?;

        Ok(credential)
    }

    /// Consume a credential: atomically claim the row, then check
    /// expiry. A second submit of the same token observes no row and
    /// fails `CredentialInvalid`; an expired token fails
    /// `CredentialExpired` with the row already removed.
    pub async fn consume(
        &self,
        token: &str,
        purpose: CredentialPurpose,
    ) -> AuthResult<EphemeralCredential> {
        let credential = self
            .credentials
            .take_by_token(token, purpose)
            .await?
            .ok_or(AuthError::CredentialInvalid)?;

        if credential.is_expired_at(Utc::now()) {
            return Err(AuthError::CredentialExpired);
        }

        Ok(credential)
    }

    /// Drop all expired rows. Optional housekeeping.
    pub async fn cleanup_expired(&self) -> AuthResult<u64> {
        Ok(self.credentials.delete_expired().await?)
    }
}
