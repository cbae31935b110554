//! Identity resolution — password login, federated find-or-link, and
//! registration.

use chrono::Utc;
use saidso_core::SaidsoError;
use saidso_core::models::user::{CreateUser, LoginMethod, UpdateUser, User};
use saidso_core::repository::UserRepository;

use crate::config::AuthConfig;
use crate::error::{AuthError, AuthResult};
use crate::password;
use crate::username;

/// An external identity provider's assertion about a user.
#[derive(Debug, Clone)]
pub struct FederatedProfile {
    /// Provider-scoped subject id.
    pub external_id: String,
    pub email: String,
    pub name: String,
    pub avatar_url: Option<String>,
}

/// Input for account registration.
#[derive(Debug, Clone)]
pub struct RegisterInput {
    pub name: String,
    pub email: String,
    pub password: String,
    pub password_confirmation: String,
}

/// Finds or creates users from password or federated credentials.
#[derive(Clone)]
pub struct IdentityService<U: UserRepository> {
    users: U,
    config: AuthConfig,
}

impl<U: UserRepository> IdentityService<U> {
    pub fn new(users: U, config: AuthConfig) -> Self {
        Self { users, config }
    }

    /// Create a password-method account. The new account is
    /// unverified and holds no username until the profile is
    /// completed.
    pub async fn register(&self, input: RegisterInput) -> AuthResult<User> {
        if input.password.len() < self.config.min_password_len {
            return Err(AuthError::PasswordTooShort(self.config.min_password_len));
        }
        if input.password != input.password_confirmation {
            return Err(AuthError::PasswordMismatch);
        }

        match self.users.get_by_email(&input.email).await {
            Ok(_) => {
                return Err(SaidsoError::AlreadyExists {
                    entity: "user".into(),
                }
                .into());
            }
            Err(SaidsoError::NotFound { .. }) => {}
            Err(e) => return Err(e.into()),
        }

        let user = self
            .users
            .create(CreateUser {
                email: input.email,
                name: input.name,
                password: Some(input.password),
                username: None,
                avatar: None,
                login_method: LoginMethod::Password,
                federated_id: None,
                email_verified_at: None,
            })
            .await?;

        Ok(user)
    }

    /// Resolve an account from email + password.
    ///
    /// Verification status is checked before the password so an
    /// unverified account reports the same way regardless of the
    /// password supplied. On success `last_login_at` is stamped.
    pub async fn resolve_by_password(&self, email: &str, raw_password: &str) -> AuthResult<User> {
        let mut user = match self.users.get_by_email(email).await {
            Ok(user) => user,
            Err(SaidsoError::NotFound { .. }) => return Err(AuthError::EmailNotRegistered),
            Err(e) => return Err(e.into()),
        };

        if !user.is_verified() {
            return Err(AuthError::EmailNotVerified);
        }

        match &user.password_hash {
            None if user.login_method == LoginMethod::Federated => {
                return Err(AuthError::PasswordLoginUnavailable);
            }
            None => return Err(AuthError::InvalidCredentials),
            Some(hash) => {
                let valid =
                    password::verify_password(raw_password, hash, self.config.pepper.as_deref())?;
                if !valid {
                    return Err(AuthError::InvalidCredentials);
                }
            }
        }

        self.users.record_login(user.id).await?;
        user.last_login_at = Some(Utc::now());

        Ok(user)
    }

    /// Find or create an account for a federated identity.
    ///
    /// Idempotent: repeated logins with the same external id resolve
    /// to the same account, and the email always ends up verified.
    pub async fn resolve_or_link_federated(&self, profile: FederatedProfile) -> AuthResult<User> {
        let existing = match self.users.get_by_email(&profile.email).await {
            Ok(user) => Some(user),
            Err(SaidsoError::NotFound { .. }) => None,
            Err(e) => return Err(e.into()),
        };

        let user = match existing {
            None => {
                let generated = username::generate_unique(&self.users, &profile.name).await?;
                self.users
                    .create(CreateUser {
                        email: profile.email,
                        name: profile.name,
                        password: None,
                        username: Some(generated),
                        avatar: profile.avatar_url,
                        login_method: LoginMethod::Federated,
                        federated_id: Some(profile.external_id),
                        email_verified_at: Some(Utc::now()),
                    })
                    .await?
            }
            Some(user) if user.federated_id.is_none() => {
                // Existing password account logging in via the
                // provider for the first time: link it.
                self.users
                    .update(
                        user.id,
                        UpdateUser {
                            federated_id: Some(profile.external_id),
                            login_method: Some(LoginMethod::Federated),
                            email_verified_at: Some(
                                user.email_verified_at.unwrap_or_else(Utc::now),
                            ),
                            ..Default::default()
                        },
                    )
                    .await?
            }
            Some(user) if !user.is_verified() => {
                // Already linked; the provider vouches for the email.
                self.users
                    .update(
                        user.id,
                        UpdateUser {
                            email_verified_at: Some(Utc::now()),
                            ..Default::default()
                        },
                    )
                    .await?
            }
            Some(user) => user,
        };

        Ok(user)
    }
}
