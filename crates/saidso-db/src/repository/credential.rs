//! SurrealDB implementation of [`CredentialRepository`].

use chrono::{DateTime, Utc};
use saidso_core::error::SaidsoResult;
use saidso_core::models::credential::{CreateCredential, CredentialPurpose, EphemeralCredential};
use saidso_core::repository::CredentialRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct CredentialRow {
    token: String,
    subject: String,
    purpose: String,
    expires_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct CredentialRowWithId {
    record_id: String,
    token: String,
    subject: String,
    purpose: String,
    expires_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

fn parse_purpose(s: &str) -> Result<CredentialPurpose, DbError> {
    match s {
        "verify-email" => Ok(CredentialPurpose::VerifyEmail),
        "reset-password" => Ok(CredentialPurpose::ResetPassword),
        other => Err(DbError::Migration(format!(
            "unknown credential purpose: {other}"
        ))),
    }
}

impl CredentialRow {
    fn into_credential(self, id: Uuid) -> Result<EphemeralCredential, DbError> {
        Ok(EphemeralCredential {
            id,
            token: self.token,
            subject: self.subject,
            purpose: parse_purpose(&self.purpose)?,
            expires_at: self.expires_at,
            created_at: self.created_at,
        })
    }
}

impl CredentialRowWithId {
    fn try_into_credential(self) -> Result<EphemeralCredential, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Migration(format!("invalid UUID: {e}")))?;
        Ok(EphemeralCredential {
            id,
            token: self.token,
            subject: self.subject,
            purpose: parse_purpose(&self.purpose)?,
            expires_at: self.expires_at,
            created_at: self.created_at,
        })
    }
}

#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

/// SurrealDB implementation of the EphemeralCredential repository.
#[derive(Clone)]
pub struct SurrealCredentialRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealCredentialRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> CredentialRepository for SurrealCredentialRepository<C> {
    async fn create(&self, input: CreateCredential) -> SaidsoResult<EphemeralCredential> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('credential', $id) SET \
                 token = $token, \
                 subject = $subject, \
                 purpose = $purpose, \
                 expires_at = $expires_at",
            )
            .bind(("id", id_str.clone()))
            .bind(("token", input.token))
            .bind(("subject", input.subject))
            .bind(("purpose", input.purpose.as_str().to_string()))
            .bind(("expires_at", input.expires_at))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        let rows: Vec<CredentialRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "credential".into(),
            id: id_str,
        })?;

        Ok(row.into_credential(id)?)
    }

    async fn purge(&self, subject: &str, purpose: CredentialPurpose) -> SaidsoResult<u64> {
        let subject_owned = subject.to_string();
        let purpose_str = purpose.as_str().to_string();

        let mut count_result = self
            .db
            .query(
                "SELECT count() AS total FROM credential \
                 WHERE subject = $subject AND purpose = $purpose \
                 GROUP ALL",
            )
            .bind(("subject", subject_owned.clone()))
            .bind(("purpose", purpose_str.clone()))
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        self.db
            .query(
                "DELETE credential \
                 WHERE subject = $subject AND purpose = $purpose",
            )
            .bind(("subject", subject_owned))
            .bind(("purpose", purpose_str))
            .await
            .map_err(DbError::from)?;

        Ok(total)
    }

    async fn take_by_token(
        &self,
        token: &str,
        purpose: CredentialPurpose,
    ) -> SaidsoResult<Option<EphemeralCredential>> {
        // Resolve the record id, then claim that exact record with a
        // single DELETE returning its prior state. Exactly one of any
        // concurrent callers observes the row — the second submit of
        // the same credential loses the claim and sees `None`.
        let token_owned = token.to_string();

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM credential \
                 WHERE token = $token AND purpose = $purpose",
            )
            .bind(("token", token_owned))
            .bind(("purpose", purpose.as_str().to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CredentialRowWithId> = result.take(0).map_err(DbError::from)?;
        let credential = match rows.into_iter().next() {
            Some(row) => row.try_into_credential()?,
            None => return Ok(None),
        };

        let mut result = self
            .db
            .query("DELETE type::record('credential', $id) RETURN BEFORE")
            .bind(("id", credential.id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CredentialRow> = result.take(0).map_err(DbError::from)?;
        match rows.into_iter().next() {
            Some(row) => Ok(Some(row.into_credential(credential.id)?)),
            None => Ok(None),
        }
    }

    async fn delete_expired(&self) -> SaidsoResult<u64> {
        let mut count_result = self
            .db
            .query(
                "SELECT count() AS total FROM credential \
                 WHERE expires_at < time::now() GROUP ALL",
            )
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        self.db
            .query("DELETE credential WHERE expires_at < time::now()")
            .await
            .map_err(DbError::from)?;

        Ok(total)
    }
}
