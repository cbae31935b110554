//! Outbound email delivery through Resend.
//!
//! Without an API key (local development, tests) messages are logged
//! instead of delivered.

use resend_rs::Resend;
use resend_rs::types::CreateEmailBaseOptions;
use saidso_core::SaidsoResult;
use saidso_core::ports::{Notification, Notifier};
use tracing::{error, info};

use crate::config::ServerConfig;

#[derive(Clone)]
pub enum MailNotifier {
    Resend { client: Resend, from: String },
    /// Logs instead of sending.
    Disabled,
}

impl MailNotifier {
    pub fn from_config(config: &ServerConfig) -> Self {
        match &config.resend_api_key {
            Some(key) => MailNotifier::Resend {
                client: Resend::new(key),
                from: config.mail_from.clone(),
            },
            None => MailNotifier::Disabled,
        }
    }

    fn render(notification: &Notification) -> (String, String) {
        match notification {
            Notification::VerifyEmail {
                recipient_name,
                verification_url,
            } => (
                "Verify your email address".to_string(),
                format!(
                    "<p>Hi {recipient_name},</p>\
                     <p>Thanks for signing up! Please confirm your email address \
                     to activate your account.</p>\
                     <p><a href=\"{verification_url}\">Verify Email Address</a></p>\
                     <p>This link expires in 24 hours. If you didn't create an \
                     account, you can ignore this email.</p>"
                ),
            ),
            Notification::ResetPassword { reset_url } => (
                "Reset your password".to_string(),
                format!(
                    "<p>We received a request to reset the password for your \
                     account.</p>\
                     <p><a href=\"{reset_url}\">Reset Password</a></p>\
                     <p>This link expires in 60 minutes. If you didn't request \
                     a reset, you can ignore this email.</p>"
                ),
            ),
        }
    }
}

impl Notifier for MailNotifier {
    async fn send(&self, to: &str, notification: Notification) -> SaidsoResult<()> {
        let (subject, html) = Self::render(&notification);

        match self {
            MailNotifier::Resend { client, from } => {
                let email = CreateEmailBaseOptions::new(from.as_str(), vec![to], subject.as_str())
                    .with_html(html.as_str());
                client.emails.send(email).await.map_err(|e| {
                    error!(to, subject, error = ?e, "email send failed");
                    saidso_core::SaidsoError::Upstream {
                        service: "resend".into(),
                        message: e.to_string(),
                    }
                })?;
                Ok(())
            }
            MailNotifier::Disabled => {
                info!(to, subject, "email delivery disabled; message dropped");
                Ok(())
            }
        }
    }
}
