//! SurrealDB implementation of [`TokenRepository`].
//!
//! Only SHA-256 digests of token secrets are stored; the plaintext
//! never reaches this layer.

use chrono::{DateTime, Utc};
use saidso_core::error::SaidsoResult;
use saidso_core::models::token::{CreateToken, Token, TokenKind};
use saidso_core::repository::TokenRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct TokenRow {
    user_id: String,
    kind: String,
    capabilities: Vec<String>,
    token_hash: String,
    expires_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct TokenRowWithId {
    record_id: String,
    user_id: String,
    kind: String,
    capabilities: Vec<String>,
    token_hash: String,
    expires_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

fn parse_kind(s: &str) -> Result<TokenKind, DbError> {
    match s {
        "Access" => Ok(TokenKind::Access),
        "Refresh" => Ok(TokenKind::Refresh),
        other => Err(DbError::Migration(format!("unknown token kind: {other}"))),
    }
}

fn kind_to_string(kind: &TokenKind) -> &'static str {
    match kind {
        TokenKind::Access => "Access",
        TokenKind::Refresh => "Refresh",
    }
}

impl TokenRow {
    fn into_token(self, id: Uuid) -> Result<Token, DbError> {
        let user_id = Uuid::parse_str(&self.user_id)
            .map_err(|e| DbError::Migration(format!("invalid user UUID: {e}")))?;
        Ok(Token {
            id,
            user_id,
            kind: parse_kind(&self.kind)?,
            capabilities: self.capabilities,
            token_hash: self.token_hash,
            expires_at: self.expires_at,
            created_at: self.created_at,
        })
    }
}

impl TokenRowWithId {
    fn try_into_token(self) -> Result<Token, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Migration(format!("invalid UUID: {e}")))?;
        let user_id = Uuid::parse_str(&self.user_id)
            .map_err(|e| DbError::Migration(format!("invalid user UUID: {e}")))?;
        Ok(Token {
            id,
            user_id,
            kind: parse_kind(&self.kind)?,
            capabilities: self.capabilities,
            token_hash: self.token_hash,
            expires_at: self.expires_at,
            created_at: self.created_at,
        })
    }
}

#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

/// SurrealDB implementation of the Token repository.
#[derive(Clone)]
pub struct SurrealTokenRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealTokenRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> TokenRepository for SurrealTokenRepository<C> {
    async fn create(&self, input: CreateToken) -> SaidsoResult<Token> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('token', $id) SET \
                 user_id = $user_id, \
                 kind = $kind, \
                 capabilities = $capabilities, \
                 token_hash = $token_hash, \
                 expires_at = $expires_at",
            )
            .bind(("id", id_str.clone()))
            .bind(("user_id", input.user_id.to_string()))
            .bind(("kind", kind_to_string(&input.kind).to_string()))
            .bind(("capabilities", input.capabilities))
            .bind(("token_hash", input.token_hash))
            .bind(("expires_at", input.expires_at))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        let rows: Vec<TokenRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "token".into(),
            id: id_str,
        })?;

        Ok(row.into_token(id)?)
    }

    async fn get_by_hash(&self, token_hash: &str) -> SaidsoResult<Token> {
        let token_hash_owned = token_hash.to_string();

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM token \
                 WHERE token_hash = $token_hash",
            )
            .bind(("token_hash", token_hash_owned.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<TokenRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "token".into(),
            id: format!("token_hash={token_hash_owned}"),
        })?;

        Ok(row.try_into_token()?)
    }

    async fn take_by_hash(&self, token_hash: &str) -> SaidsoResult<Option<Token>> {
        // Resolve the record id first, then claim that exact record
        // with a single DELETE returning its prior state. Record ids
        // are never reused, so of any concurrent callers presenting
        // the same digest exactly one observes the deleted row.
        let token = match self.get_by_hash(token_hash).await {
            Ok(token) => token,
            Err(saidso_core::SaidsoError::NotFound { .. }) => return Ok(None),
            Err(e) => return Err(e),
        };

        let mut result = self
            .db
            .query("DELETE type::record('token', $id) RETURN BEFORE")
            .bind(("id", token.id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<TokenRow> = result.take(0).map_err(DbError::from)?;
        match rows.into_iter().next() {
            Some(row) => Ok(Some(row.into_token(token.id)?)),
            // Another caller deleted the row between lookup and claim.
            None => Ok(None),
        }
    }

    async fn delete(&self, id: Uuid) -> SaidsoResult<()> {
        self.db
            .query("DELETE type::record('token', $id)")
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn delete_expired(&self) -> SaidsoResult<u64> {
        // Count expired tokens first, then delete.
        let mut count_result = self
            .db
            .query(
                "SELECT count() AS total FROM token \
                 WHERE expires_at < time::now() GROUP ALL",
            )
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        self.db
            .query("DELETE token WHERE expires_at < time::now()")
            .await
            .map_err(DbError::from)?;

        Ok(total)
    }
}
