//! Token Codec
//!
//! Signed, opaque bearer tokens bound to an identity id.
//!
//! Format: `base64url(json{id, iat, exp?}).base64url(hmac_sha256)`.
//! The signature covers the encoded payload and is checked before the
//! payload is parsed.

use chrono::Utc;
use hmac::{Hmac, Mac};
use platform::crypto::{from_base64_url, to_base64_url};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::time::Duration;

use crate::application::config::AuthConfig;
use crate::domain::value_object::identity_id::IdentityId;
use crate::error::{AuthError, AuthResult};

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    id: i64,
    iat: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    exp: Option<i64>,
}

/// Issues and verifies tokens under one process-wide secret
pub struct TokenCodec {
    secret: [u8; 32],
    ttl: Option<Duration>,
}

impl TokenCodec {
    pub fn new(secret: [u8; 32], ttl: Option<Duration>) -> Self {
        Self { secret, ttl }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(config.token_secret, config.token_ttl)
    }

    fn mac(&self) -> AuthResult<HmacSha256> {
        HmacSha256::new_from_slice(&self.secret)
            .map_err(|e| AuthError::Unexpected(format!("HMAC key rejected: {}", e)))
    }

    /// Issue a token for `id`
    pub fn issue(&self, id: IdentityId) -> AuthResult<String> {
        let now = Utc::now().timestamp();
        let exp = self
            .ttl
            .map(|ttl| {
                i64::try_from(ttl.as_secs())
                    .ok()
                    .and_then(|secs| now.checked_add(secs))
                    .ok_or_else(|| AuthError::Unexpected("Token lifetime out of range".into()))
            })
            .transpose()?;
        let claims = Claims {
            id: id.as_i64(),
            iat: now,
            exp,
        };
        let json = serde_json::to_vec(&claims)
            .map_err(|e| AuthError::Unexpected(format!("Token encoding failed: {}", e)))?;
        let payload = to_base64_url(&json);

        let mut mac = self.mac()?;
        mac.update(payload.as_bytes());
        let signature = to_base64_url(&mac.finalize().into_bytes());

        Ok(format!("{}.{}", payload, signature))
    }

    /// Verify a token and return its subject
    pub fn verify(&self, token: &str) -> AuthResult<IdentityId> {
        let (payload, signature) = token.split_once('.').ok_or(AuthError::InvalidToken)?;
        if signature.contains('.') {
            return Err(AuthError::InvalidToken);
        }

        let signature = from_base64_url(signature).map_err(|_| AuthError::InvalidToken)?;

        // Constant-time comparison
        let mut mac = self.mac()?;
        mac.update(payload.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| AuthError::InvalidToken)?;

        let json = from_base64_url(payload).map_err(|_| AuthError::InvalidToken)?;
        let claims: Claims = serde_json::from_slice(&json).map_err(|_| AuthError::InvalidToken)?;

        if claims.exp.is_some_and(|exp| Utc::now().timestamp() >= exp) {
            return Err(AuthError::InvalidToken);
        }

        Ok(IdentityId::from_i64(claims.id))
    }
}
