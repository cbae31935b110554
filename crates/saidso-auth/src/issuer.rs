//! Capability-scoped bearer token issuance, validation, and
//! revocation against the token store.

use chrono::{Duration, Utc};
use saidso_core::models::token::{
    CAP_ACCESS_API, CAP_ISSUE_ACCESS_TOKEN, CreateToken, Token, TokenKind,
};
use saidso_core::repository::TokenRepository;
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::error::{AuthError, AuthResult};
use crate::token;

/// A freshly minted token: the plaintext secret is handed out exactly
/// once here and never retrievable again.
#[derive(Debug)]
pub struct IssuedToken {
    pub secret: String,
    pub token: Token,
}

/// The access + refresh pair returned to clients.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds.
    pub expires_in: u64,
}

/// Mints, validates, and revokes bearer tokens.
#[derive(Clone)]
pub struct TokenIssuer<T: TokenRepository> {
    tokens: T,
    config: AuthConfig,
}

impl<T: TokenRepository> TokenIssuer<T> {
    pub fn new(tokens: T, config: AuthConfig) -> Self {
        Self { tokens, config }
    }

    fn ttl_and_capabilities(&self, kind: TokenKind) -> (u64, Vec<String>) {
        match kind {
            TokenKind::Access => (
                self.config.access_token_ttl_secs,
                vec![CAP_ACCESS_API.to_string()],
            ),
            TokenKind::Refresh => (
                self.config.refresh_token_ttl_secs,
                vec![CAP_ISSUE_ACCESS_TOKEN.to_string()],
            ),
        }
    }

    /// Mint a token of the given kind for `user_id`.
    pub async fn issue(&self, user_id: Uuid, kind: TokenKind) -> AuthResult<IssuedToken> {
        let (ttl_secs, capabilities) = self.ttl_and_capabilities(kind);
        let secret = token::generate_token_secret();
        let token_hash = token::hash_token_secret(&secret);

        let row = self
            .tokens
            .create(CreateToken {
                user_id,
                kind,
                capabilities,
                token_hash,
                expires_at: Utc::now() + Duration::seconds(ttl_secs as i64),
            })
            .await?;

        Ok(IssuedToken { secret, token: row })
    }

    /// Mint a fresh access + refresh pair.
    pub async fn issue_pair(&self, user_id: Uuid) -> AuthResult<TokenPair> {
        let access = self.issue(user_id, TokenKind::Access).await?;
        let refresh = self.issue(user_id, TokenKind::Refresh).await?;

        Ok(TokenPair {
            access_token: access.secret,
            refresh_token: refresh.secret,
            expires_in: self.config.access_token_ttl_secs,
        })
    }

    /// Resolve a plaintext secret to its stored token.
    ///
    /// An expired row is deleted as a side effect of the lookup.
    pub async fn validate(&self, secret: &str) -> AuthResult<Token> {
        let token_hash = token::hash_token_secret(secret);
        let token = match self.tokens.get_by_hash(&token_hash).await {
            Ok(token) => token,
            Err(saidso_core::SaidsoError::NotFound { .. }) => {
                return Err(AuthError::TokenInvalid(
                    "token not found or already used".into(),
                ));
            }
            Err(e) => return Err(e.into()),
        };

        if token.is_expired_at(Utc::now()) {
            let _ = self.tokens.delete(token.id).await;
            return Err(AuthError::TokenExpired);
        }

        Ok(token)
    }

    /// Validate a secret and require a capability on the result.
    pub async fn validate_capability(&self, secret: &str, capability: &str) -> AuthResult<Token> {
        let token = self.validate(secret).await?;
        if !token.has_capability(capability) {
            return Err(AuthError::InvalidTokenType);
        }
        Ok(token)
    }

    /// Atomically claim the token matching `secret`: delete it and
    /// return its prior row. Exactly one of any concurrent callers
    /// observes `Some` — the serialization point for rotation.
    pub async fn consume(&self, secret: &str) -> AuthResult<Option<Token>> {
        let token_hash = token::hash_token_secret(secret);
        Ok(self.tokens.take_by_hash(&token_hash).await?)
    }

    /// Delete a token row. Idempotent.
    pub async fn revoke(&self, token_id: Uuid) -> AuthResult<()> {
        Ok(self.tokens.delete(token_id).await?)
    }

    /// Drop all expired rows. Optional housekeeping; expiry is already
    /// enforced lazily at validation time.
    pub async fn cleanup_expired(&self) -> AuthResult<u64> {
        Ok(self.tokens.delete_expired().await?)
    }
}
