//! Google OAuth adapter: consent-page redirect and authorization-code
//! exchange, yielding a [`FederatedProfile`] for the identity
//! resolver.

use saidso_auth::FederatedProfile;
use saidso_core::SaidsoError;
use serde::Deserialize;
use tracing::error;

use crate::config::GoogleConfig;

const AUTHORIZE_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const USERINFO_URL: &str = "https://openidconnect.googleapis.com/v1/userinfo";

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    error: String,
    error_description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UserInfo {
    sub: String,
    email: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    picture: Option<String>,
}

#[derive(Clone)]
pub struct GoogleOAuth {
    client_id: String,
    client_secret: String,
    redirect_url: String,
    http: reqwest::Client,
}

impl GoogleOAuth {
    pub fn new(config: &GoogleConfig) -> Self {
        Self {
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            redirect_url: config.redirect_url.clone(),
            http: reqwest::Client::new(),
        }
    }

    /// URL of Google's consent page for this client.
    pub fn authorize_url(&self) -> String {
        format!(
            "{AUTHORIZE_URL}?client_id={}&redirect_uri={}&response_type=code&scope={}",
            urlencoding::encode(&self.client_id),
            urlencoding::encode(&self.redirect_url),
            urlencoding::encode("openid email profile"),
        )
    }

    /// Exchange an authorization code for the provider's identity
    /// assertion.
    pub async fn exchange_code(&self, code: &str) -> Result<FederatedProfile, SaidsoError> {
        let form_body = format!(
            "grant_type=authorization_code&code={}&client_id={}&client_secret={}&redirect_uri={}",
            urlencoding::encode(code),
            urlencoding::encode(&self.client_id),
            urlencoding::encode(&self.client_secret),
            urlencoding::encode(&self.redirect_url),
        );

        let resp = self
            .http
            .post(TOKEN_URL)
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(form_body)
            .send()
            .await
            .map_err(|e| upstream(format!("token request: {e}")))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| upstream(format!("token response body: {e}")))?;

        if !status.is_success() {
            if let Ok(err) = serde_json::from_str::<TokenErrorResponse>(&body) {
                error!(error = %err.error, "Google code exchange rejected");
                return Err(upstream(format!(
                    "{}: {}",
                    err.error,
                    err.error_description.unwrap_or_default()
                )));
            }
            return Err(upstream(format!("token endpoint HTTP {status}")));
        }

        let token: TokenResponse = serde_json::from_str(&body)
            .map_err(|e| upstream(format!("token response parse: {e}")))?;

        let info: UserInfo = self
            .http
            .get(USERINFO_URL)
            .bearer_auth(&token.access_token)
            .send()
            .await
            .map_err(|e| upstream(format!("userinfo request: {e}")))?
            .json()
            .await
            .map_err(|e| upstream(format!("userinfo parse: {e}")))?;

        let name = info
            .name
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| info.email.clone());

        Ok(FederatedProfile {
            external_id: info.sub,
            email: info.email,
            name,
            avatar_url: info.picture,
        })
    }
}

fn upstream(message: String) -> SaidsoError {
    SaidsoError::Upstream {
        service: "google-oauth".into(),
        message,
    }
}
