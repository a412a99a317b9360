//! Email verification code
//!
//! 32 bytes from the OS CSPRNG, base64url without padding (43 characters).
//! Lookups go through the database index, never through string comparison
//! in application code.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{AuthError, AuthResult};

const CODE_BYTES: usize = 32;
const CODE_LENGTH: usize = 43;

#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VerificationCode(String);

impl VerificationCode {
    /// Generate a fresh code
    pub fn generate() -> Self {
        Self(platform::crypto::random_token(CODE_BYTES))
    }

    /// Parse a code supplied by a caller
    ///
    /// Anything that could never have been generated is rejected up front.
    pub fn parse(raw: impl AsRef<str>) -> AuthResult<Self> {
        let raw = raw.as_ref().trim();
        let well_formed = raw.len() == CODE_LENGTH
            && raw
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !well_formed {
            return Err(AuthError::VerificationNotFound);
        }
        Ok(Self(raw.to_string()))
    }

    pub fn from_db(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for VerificationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // First few characters are enough to correlate logs
        let prefix: String = self.0.chars().take(6).collect();
        write!(f, "VerificationCode({}…)", prefix)
    }
}

impl fmt::Display for VerificationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
