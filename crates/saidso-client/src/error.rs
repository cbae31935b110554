//! Client-side error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    /// No stored session; the caller must authenticate first.
    #[error("not authenticated")]
    NotAuthenticated,

    /// Renewal failed or the renewed session was rejected; stored
    /// credentials were cleared and re-authentication is required.
    #[error("session expired; re-authentication required")]
    SessionExpired,

    /// The API answered with a non-success status.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("session storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type ClientResult<T> = Result<T, ClientError>;
