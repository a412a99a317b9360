//! Mail Transports
//!
//! `HttpMailer` posts to a Mailgun-style HTTP API; `LogMailer` only writes
//! the message to the log.

use reqwest::Client;
use std::time::Duration;

use crate::application::config::MailConfig;
use crate::domain::mailer::Mailer;
use crate::domain::value_object::{email::Email, verification_code::VerificationCode};
use crate::error::{AuthError, AuthResult};

const VERIFICATION_SUBJECT: &str = "Verify your email";

fn verification_body(code: &VerificationCode) -> String {
    format!(
        "Please confirm your email address.\n\nYour verification code is: {}\n",
        code
    )
}

/// HTTP API mailer
#[derive(Clone)]
pub struct HttpMailer {
    client: Client,
    config: MailConfig,
}

impl HttpMailer {
    pub fn new(config: MailConfig) -> AuthResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| AuthError::Unexpected(format!("Mail client build failed: {}", e)))?;
        Ok(Self { client, config })
    }
}

impl Mailer for HttpMailer {
    async fn send_verification_email(
        &self,
        to: &Email,
        code: &VerificationCode,
    ) -> AuthResult<()> {
        let url = format!("{}/messages", self.config.api_base_url.trim_end_matches('/'));
        let body = verification_body(code);
        let form = [
            ("from", self.config.from.as_str()),
            ("to", to.as_str()),
            ("subject", VERIFICATION_SUBJECT),
            ("text", body.as_str()),
        ];

        let response = self
            .client
            .post(&url)
            .basic_auth("api", Some(&self.config.api_key))
            .form(&form)
            .send()
            .await
            .map_err(|e| AuthError::MailDelivery(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AuthError::MailDelivery(format!(
                "Mail API responded with {}",
                status
            )));
        }

        tracing::debug!(to_domain = %to.domain(), "Mail API accepted message");
        Ok(())
    }
}

/// Mailer that only logs; selected when no mail API is configured
#[derive(Clone, Default)]
pub struct LogMailer;

impl Mailer for LogMailer {
    async fn send_verification_email(
        &self,
        to: &Email,
        code: &VerificationCode,
    ) -> AuthResult<()> {
        tracing::info!(
            to = %to,
            code = %code,
            "Verification email (not sent, no mail API configured)"
        );
        Ok(())
    }
}

/// Mailer chosen at startup from configuration
#[derive(Clone)]
pub enum AppMailer {
    Http(HttpMailer),
    Log(LogMailer),
}

impl AppMailer {
    pub fn from_config(config: Option<&MailConfig>) -> AuthResult<Self> {
        match config {
            Some(mail) => Ok(AppMailer::Http(HttpMailer::new(mail.clone())?)),
            None => {
                tracing::warn!("No mail API configured, verification codes will only be logged");
                Ok(AppMailer::Log(LogMailer))
            }
        }
    }
}

impl Mailer for AppMailer {
    async fn send_verification_email(
        &self,
        to: &Email,
        code: &VerificationCode,
    ) -> AuthResult<()> {
        match self {
            AppMailer::Http(m) => m.send_verification_email(to, code).await,
            AppMailer::Log(m) => m.send_verification_email(to, code).await,
        }
    }
}
