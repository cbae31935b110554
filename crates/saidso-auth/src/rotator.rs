//! Refresh token rotation.
//!
//! A refresh token is single-use: rotation claims it atomically and
//! mints a replacement pair, so a stolen token replayed after the
//! legitimate renewal is rejected.

use saidso_core::models::token::CAP_ISSUE_ACCESS_TOKEN;
use saidso_core::repository::TokenRepository;
use uuid::Uuid;

use crate::error::{AuthError, AuthResult};
use crate::issuer::{TokenIssuer, TokenPair};

/// A successful rotation: the replacement pair and its owner.
#[derive(Debug, Clone)]
pub struct RotatedPair {
    pub user_id: Uuid,
    pub pair: TokenPair,
}

#[derive(Clone)]
pub struct RefreshRotator<T: TokenRepository> {
    issuer: TokenIssuer<T>,
}

impl<T: TokenRepository> RefreshRotator<T> {
    pub fn new(issuer: TokenIssuer<T>) -> Self {
        Self { issuer }
    }

    /// Consume the presented refresh token and mint a new pair.
    ///
    /// Fails `TokenInvalid`/`TokenExpired` when the token is unknown
    /// or stale, and `InvalidTokenType` when a token without the
    /// `issue-access-token` capability (i.e. an access token) is
    /// presented. The capability check runs before the claim, so a
    /// misdirected access token is rejected without being revoked.
    pub async fn rotate(&self, presented_secret: &str) -> AuthResult<RotatedPair> {
        let token = self.issuer.validate(presented_secret).await?;

        if !token.has_capability(CAP_ISSUE_ACCESS_TOKEN) {
            return Err(AuthError::InvalidTokenType);
        }

        // Single-use guarantee: of two concurrent rotations presenting
        // the same token, only the one that wins this claim proceeds.
        let claimed = self.issuer.consume(presented_secret).await?;
        if claimed.is_none() {
            return Err(AuthError::TokenInvalid(
                "refresh token already used".into(),
            ));
        }

        let pair = self.issuer.issue_pair(token.user_id).await?;
        Ok(RotatedPair {
            user_id: token.user_id,
            pair,
        })
    }
}
