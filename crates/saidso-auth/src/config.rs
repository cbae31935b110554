//! Authentication configuration.
//!
//! Constructed once at startup and passed to each service; no
//! component reads the process environment on its own.

/// Configuration for the authentication services.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Access token lifetime in seconds (default: 180 = 3 minutes).
    pub access_token_ttl_secs: u64,
    /// Refresh token lifetime in seconds (default: 1200 = 20 minutes,
    /// the value the server-side issuance path uses).
    pub refresh_token_ttl_secs: u64,
    /// Email-verification credential lifetime in seconds
    /// (default: 86_400 = 24 hours).
    pub verify_email_ttl_secs: u64,
    /// Password-reset credential lifetime in seconds
    /// (default: 3_600 = 60 minutes).
    pub reset_password_ttl_secs: u64,
    /// Length of ephemeral credential tokens (default: 64).
    pub credential_token_len: usize,
    /// Minimum password length for registration and reset (default: 8).
    pub min_password_len: usize,
    /// Front-end base URL used in email links and the OAuth redirect.
    pub frontend_base_url: String,
    /// Optional pepper prepended to passwords before Argon2id
    /// verification.
    pub pepper: Option<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            access_token_ttl_secs: 180,
            refresh_token_ttl_secs: 1200,
            verify_email_ttl_secs: 86_400,
            reset_password_ttl_secs: 3_600,
            credential_token_len: 64,
            min_password_len: 8,
            frontend_base_url: "http://localhost:5173".into(),
            pepper: None,
        }
    }
}
