//! Opaque bearer secret generation and digesting.
//!
//! Bearer secrets are 32 random bytes, base64url-encoded. Ephemeral
//! credential tokens are longer alphanumeric strings suitable for
//! embedding in email links. Only SHA-256 digests are ever persisted.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::Rng;
use sha2::{Digest, Sha256};

/// Generate a cryptographically random opaque bearer secret
/// (32 bytes → base64url-encoded, no padding).
pub fn generate_token_secret() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 32] = rng.random();
    URL_SAFE_NO_PAD.encode(bytes)
}

/// SHA-256 hash of a raw bearer secret, hex-encoded.
///
/// This is the value stored in the database as `token.token_hash`.
pub fn hash_token_secret(raw: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(raw.as_bytes());
    hex::encode(hasher.finalize())
}

/// Generate a random alphanumeric credential token of the given
/// length, for email-verification and password-reset links.
pub fn generate_credential_token(len: usize) -> String {
    rand::rng()
        .sample_iter(&rand::distr::Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_secret_is_url_safe() {
        let secret = generate_token_secret();
        // base64url characters only (A-Z a-z 0-9 - _), no padding.
        assert!(
            secret
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
        // 32 bytes → 43 base64url chars.
        assert_eq!(secret.len(), 43);
    }

    #[test]
    fn token_secrets_are_unique() {
        assert_ne!(generate_token_secret(), generate_token_secret());
    }

    #[test]
    fn token_hash_is_deterministic() {
        let raw = "some-bearer-secret";
        assert_eq!(hash_token_secret(raw), hash_token_secret(raw));
    }

    #[test]
    fn different_secrets_different_hashes() {
        let h1 = hash_token_secret("secret-a");
        let h2 = hash_token_secret("secret-b");
        assert_ne!(h1, h2);
    }

    #[test]
    fn credential_token_has_requested_length() {
        let token = generate_credential_token(64);
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
    }
}
