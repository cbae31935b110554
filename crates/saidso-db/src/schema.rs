//! Schema definitions and migration runner for SurrealDB.
//!
//! All table definitions use SCHEMAFULL mode for data integrity.
//! UUIDs are stored as strings. Enums are stored as strings with
//! ASSERT constraints for validation.
//!
//! Username and federated-id uniqueness is enforced at the service
//! layer: a DB-level unique index would also reject the many rows
//! where those optional fields are unset.

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;

use crate::error::DbError;

// -----------------------------------------------------------------------
// Migration tracking
// -----------------------------------------------------------------------

const MIGRATION_TABLE_DDL: &str = "\
DEFINE TABLE IF NOT EXISTS _migration SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS version ON TABLE _migration TYPE int;
DEFINE FIELD IF NOT EXISTS name ON TABLE _migration TYPE string;
DEFINE FIELD IF NOT EXISTS applied_at ON TABLE _migration TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_migration_version ON TABLE _migration \
    COLUMNS version UNIQUE;
";

#[derive(Debug, SurrealValue)]
struct MigrationRecord {
    version: u32,
    #[allow(dead_code)]
    name: String,
}

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

static MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "initial_schema",
    sql: SCHEMA_V1,
}];

// -----------------------------------------------------------------------
// Schema v1 — initial table definitions
// -----------------------------------------------------------------------

const SCHEMA_V1: &str = "\
-- =======================================================================
-- Users
-- =======================================================================
DEFINE TABLE user SCHEMAFULL;
DEFINE FIELD email ON TABLE user TYPE string;
DEFINE FIELD password_hash ON TABLE user TYPE option<string>;
DEFINE FIELD username ON TABLE user TYPE option<string>;
DEFINE FIELD name ON TABLE user TYPE string;
DEFINE FIELD country ON TABLE user TYPE option<string>;
DEFINE FIELD avatar ON TABLE user TYPE option<string>;
DEFINE FIELD email_verified_at ON TABLE user TYPE option<datetime>;
DEFINE FIELD login_method ON TABLE user TYPE string \
    ASSERT $value IN ['Password', 'Federated'];
DEFINE FIELD federated_id ON TABLE user TYPE option<string>;
DEFINE FIELD last_login_at ON TABLE user TYPE option<datetime>;
DEFINE FIELD is_profile_completed ON TABLE user TYPE bool DEFAULT false;
DEFINE FIELD created_at ON TABLE user TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE user TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_user_email ON TABLE user COLUMNS email UNIQUE;
DEFINE INDEX idx_user_username ON TABLE user COLUMNS username;
DEFINE INDEX idx_user_federated_id ON TABLE user COLUMNS federated_id;

-- =======================================================================
-- Bearer tokens (access + refresh)
-- =======================================================================
DEFINE TABLE token SCHEMAFULL;
DEFINE FIELD user_id ON TABLE token TYPE string;
DEFINE FIELD kind ON TABLE token TYPE string \
    ASSERT $value IN ['Access', 'Refresh'];
DEFINE FIELD capabilities ON TABLE token TYPE array;
DEFINE FIELD capabilities.* ON TABLE token TYPE string;
DEFINE FIELD token_hash ON TABLE token TYPE string;
DEFINE FIELD expires_at ON TABLE token TYPE datetime;
DEFINE FIELD created_at ON TABLE token TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_token_hash ON TABLE token COLUMNS token_hash UNIQUE;
DEFINE INDEX idx_token_user ON TABLE token COLUMNS user_id;

-- =======================================================================
-- Ephemeral credentials (verify-email, reset-password)
-- =======================================================================
DEFINE TABLE credential SCHEMAFULL;
DEFINE FIELD token ON TABLE credential TYPE string;
DEFINE FIELD subject ON TABLE credential TYPE string;
DEFINE FIELD purpose ON TABLE credential TYPE string \
    ASSERT $value IN ['verify-email', 'reset-password'];
DEFINE FIELD expires_at ON TABLE credential TYPE datetime;
DEFINE FIELD created_at ON TABLE credential TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_credential_token ON TABLE credential \
    COLUMNS token UNIQUE;
DEFINE INDEX idx_credential_subject ON TABLE credential \
    COLUMNS subject, purpose;

-- =======================================================================
-- Devices (best-effort session bookkeeping)
-- =======================================================================
DEFINE TABLE device SCHEMAFULL;
DEFINE FIELD user_id ON TABLE device TYPE string;
DEFINE FIELD ip_address ON TABLE device TYPE string;
DEFINE FIELD device_class ON TABLE device TYPE string;
DEFINE FIELD last_active_at ON TABLE device TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_device_identity ON TABLE device \
    COLUMNS user_id, ip_address, device_class UNIQUE;
";

// -----------------------------------------------------------------------
// Public API
// -----------------------------------------------------------------------

/// Run all pending migrations against the given SurrealDB client.
///
/// Creates a `_migration` tracking table on first run, then applies
/// each migration whose version exceeds the current maximum.
/// All DEFINE statements are idempotent so re-running is safe.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<(), DbError> {
    // Ensure migration tracking table exists (idempotent).
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(e.to_string()))?;

    // Determine current schema version.
    let mut result = db
        .query("SELECT * FROM _migration ORDER BY version DESC LIMIT 1")
        .await?;
    let records: Vec<MigrationRecord> = result.take(0)?;
    let current_version = records.first().map(|m| m.version).unwrap_or(0);

    for migration in MIGRATIONS {
        if migration.version > current_version {
            info!(
                version = migration.version,
                name = migration.name,
                "Applying migration"
            );
            db.query(migration.sql).await?.check().map_err(|e| {
                DbError::Migration(format!(
                    "Migration v{} '{}' failed: {}",
                    migration.version, migration.name, e,
                ))
            })?;

            // Record the applied migration.
            db.query(
                "CREATE _migration SET version = $version, \
                 name = $name",
            )
            .bind(("version", migration.version))
            .bind(("name", migration.name))
            .await?
            .check()
            .map_err(|e| {
                DbError::Migration(format!(
                    "Failed to record migration v{}: {}",
                    migration.version, e,
                ))
            })?;

            info!(
                version = migration.version,
                "Migration applied successfully"
            );
        }
    }

    Ok(())
}

/// Returns the raw schema DDL for version 1.
///
/// Exposed for testing with in-memory SurrealDB instances that
/// bypass the migration runner.
pub fn schema_v1() -> &'static str {
    SCHEMA_V1
}
