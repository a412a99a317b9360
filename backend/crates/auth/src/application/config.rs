//! Application Configuration
//!
//! Configuration for the Auth application layer. Read once at startup.

use std::time::Duration;

pub use platform::password::HashCost;

/// Default request header carrying the token
pub const DEFAULT_TOKEN_HEADER: &str = "x-jwt";

/// Outbound mail API settings
#[derive(Debug, Clone)]
pub struct MailConfig {
    /// Base URL of the mail API, e.g. `https://api.mailgun.net/v3/example.com`
    pub api_base_url: String,
    pub api_key: String,
    /// Sender address
    pub from: String,
}

/// Auth application configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Token secret key for HMAC signing (32 bytes)
    pub token_secret: [u8; 32],
    /// Request header the authenticator reads
    pub token_header: String,
    /// Token lifetime; `None` issues tokens without expiry
    pub token_ttl: Option<Duration>,
    /// Argon2id cost
    pub password_cost: HashCost,
    /// Password pepper (optional, application-wide secret)
    pub password_pepper: Option<Vec<u8>>,
    /// Mail API settings; `None` logs mail instead of sending it
    pub mail: Option<MailConfig>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_secret: [0u8; 32],
            token_header: DEFAULT_TOKEN_HEADER.to_string(),
            token_ttl: None,
            password_cost: HashCost::default(),
            password_pepper: None,
            mail: None,
        }
    }
}

impl AuthConfig {
    /// Create config with a random token secret
    pub fn with_random_secret() -> Self {
        use rand::RngCore;
        let mut secret = [0u8; 32];
        rand::rng().fill_bytes(&mut secret);
        Self {
            token_secret: secret,
            ..Default::default()
        }
    }

    /// Create config for development (random secret, week-long tokens)
    pub fn development() -> Self {
        Self {
            token_ttl: Some(Duration::from_secs(7 * 24 * 3600)),
            ..Self::with_random_secret()
        }
    }

    pub fn with_token_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.token_ttl = ttl;
        self
    }

    pub fn with_token_header(mut self, header: impl Into<String>) -> Self {
        self.token_header = header.into();
        self
    }

    pub fn with_password_cost(mut self, cost: HashCost) -> Self {
        self.password_cost = cost;
        self
    }

    pub fn with_mail(mut self, mail: MailConfig) -> Self {
        self.mail = Some(mail);
        self
    }

    /// Get password pepper as slice
    pub fn pepper(&self) -> Option<&[u8]> {
        self.password_pepper.as_deref()
    }
}
