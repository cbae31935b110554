//! Database-specific error types and conversions.

use saidso_core::SaidsoError;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },
}

impl From<DbError> for SaidsoError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => SaidsoError::NotFound { entity, id },
            other => SaidsoError::Database(other.to_string()),
        }
    }
}
