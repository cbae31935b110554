//! Authentication error types.

use saidso_core::SaidsoError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    /// Login deliberately discloses registration status: an unknown
    /// email is reported distinctly from a wrong password.
    #[error("the provided email is not registered")]
    EmailNotRegistered,

    #[error("email address has not been verified")]
    EmailNotVerified,

    #[error("incorrect password")]
    InvalidCredentials,

    #[error("this account uses federated login")]
    PasswordLoginUnavailable,

    #[error("token has expired")]
    TokenExpired,

    #[error("invalid token: {0}")]
    TokenInvalid(String),

    /// A token without the required capability was presented, e.g. an
    /// access token where a refresh token was expected.
    #[error("invalid token type")]
    InvalidTokenType,

    #[error("invalid or unknown credential")]
    CredentialInvalid,

    #[error("credential has expired")]
    CredentialExpired,

    #[error("password must be at least {0} characters")]
    PasswordTooShort(usize),

    #[error("password confirmation does not match")]
    PasswordMismatch,

    #[error("cryptography error: {0}")]
    Crypto(String),

    #[error(transparent)]
    Core(#[from] SaidsoError),
}

pub type AuthResult<T> = Result<T, AuthError>;

impl From<AuthError> for SaidsoError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::EmailNotRegistered => SaidsoError::NotFound {
                entity: "user".into(),
                id: "email".into(),
            },
            AuthError::CredentialInvalid => SaidsoError::NotFound {
                entity: "credential".into(),
                id: "token".into(),
            },
            AuthError::TokenExpired => SaidsoError::Expired {
                what: "token".into(),
            },
            AuthError::CredentialExpired => SaidsoError::Expired {
                what: "credential".into(),
            },
            AuthError::PasswordTooShort(_) | AuthError::PasswordMismatch => {
                SaidsoError::Validation {
                    message: err.to_string(),
                }
            }
            AuthError::EmailNotVerified
            | AuthError::InvalidCredentials
            | AuthError::PasswordLoginUnavailable
            | AuthError::TokenInvalid(_)
            | AuthError::InvalidTokenType => SaidsoError::Unauthorized {
                reason: err.to_string(),
            },
            AuthError::Crypto(msg) => SaidsoError::Crypto(msg),
            AuthError::Core(inner) => inner,
        }
    }
}
