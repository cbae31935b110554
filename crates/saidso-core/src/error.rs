//! Error types shared across the Saidso identity core.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SaidsoError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Entity already exists: {entity}")]
    AlreadyExists { entity: String },

    #[error("Unauthorized: {reason}")]
    Unauthorized { reason: String },

    #[error("Expired: {what}")]
    Expired { what: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Upstream {service} failure: {message}")]
    Upstream { service: String, message: String },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Cryptography error: {0}")]
    Crypto(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type SaidsoResult<T> = Result<T, SaidsoError>;
