//! Server configuration, read from the environment once at startup.

use std::env;

use saidso_auth::AuthConfig;
use saidso_db::DbConfig;

/// Everything the server binary needs, assembled in one place.
/// Components receive the pieces they need; nothing reads the
/// environment after startup.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// TCP port to listen on.
    pub port: u16,
    pub db: DbConfig,
    pub auth: AuthConfig,
    /// Resend API key; when absent, outbound email is logged instead
    /// of delivered (development mode).
    pub resend_api_key: Option<String>,
    /// From address for outbound email.
    pub mail_from: String,
    /// Directory backing the development blob store.
    pub avatar_storage_dir: String,
    pub google: Option<GoogleConfig>,
}

#[derive(Debug, Clone)]
pub struct GoogleConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_url: String,
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl ServerConfig {
    /// Assemble the configuration from the process environment.
    pub fn from_env() -> Self {
        let auth_defaults = AuthConfig::default();
        let auth = AuthConfig {
            access_token_ttl_secs: env_parse_or(
                "ACCESS_TOKEN_TTL_SECS",
                auth_defaults.access_token_ttl_secs,
            ),
            refresh_token_ttl_secs: env_parse_or(
                "REFRESH_TOKEN_TTL_SECS",
                auth_defaults.refresh_token_ttl_secs,
            ),
            verify_email_ttl_secs: env_parse_or(
                "VERIFY_EMAIL_TTL_SECS",
                auth_defaults.verify_email_ttl_secs,
            ),
            reset_password_ttl_secs: env_parse_or(
                "RESET_PASSWORD_TTL_SECS",
                auth_defaults.reset_password_ttl_secs,
            ),
            credential_token_len: auth_defaults.credential_token_len,
            min_password_len: auth_defaults.min_password_len,
            frontend_base_url: env_or("FRONTEND_URL", "http://localhost:5173"),
            pepper: env::var("PASSWORD_PEPPER").ok(),
        };

        let db = DbConfig {
            url: env_or("DATABASE_URL", "ws://127.0.0.1:8000"),
            namespace: env_or("DATABASE_NS", "saidso"),
            database: env_or("DATABASE_DB", "main"),
            username: env_or("DATABASE_USER", "root"),
            password: env_or("DATABASE_PASS", "root"),
        };

        let google = match (
            env::var("GOOGLE_CLIENT_ID"),
            env::var("GOOGLE_CLIENT_SECRET"),
        ) {
            (Ok(client_id), Ok(client_secret)) => Some(GoogleConfig {
                client_id,
                client_secret,
                redirect_url: env_or(
                    "GOOGLE_REDIRECT_URL",
                    "http://127.0.0.1:3000/auth/google/callback",
                ),
            }),
            _ => None,
        };

        Self {
            port: env_parse_or("PORT", 3000),
            db,
            auth,
            resend_api_key: env::var("RESEND_API_KEY").ok(),
            mail_from: env_or("MAIL_FROM", "Saidso <noreply@saidso.app>"),
            avatar_storage_dir: env_or("AVATAR_STORAGE_DIR", "storage/avatars"),
            google,
        }
    }
}
