//! User Password Value Object
//!
//! Domain wrapper over `platform::password`.
//! Clear text is zeroized on drop and never printed; only the Argon2id PHC
//! string is ever persisted.

use platform::password::{
    ClearTextPassword, HashCost, HashedPassword, PasswordHashError, PasswordPolicyError,
};
use std::fmt;

use crate::error::{AuthError, AuthResult};

/// Raw password from user input
pub struct RawPassword(ClearTextPassword);

impl RawPassword {
    /// Create a new raw password with validation
    ///
    /// ## Validation Rules
    /// - Not empty or whitespace only
    /// - At most 128 characters after NFKC normalization
    /// - No control characters other than tab and newline
    pub fn new(raw: String) -> AuthResult<Self> {
        let clear_text = ClearTextPassword::new(raw).map_err(|e| match e {
            PasswordPolicyError::TooLong { max, actual } => AuthError::Validation(format!(
                "Password must be at most {} characters (got {})",
                max, actual
            )),
            PasswordPolicyError::EmptyOrWhitespace => {
                AuthError::Validation("Password cannot be empty".into())
            }
            PasswordPolicyError::InvalidCharacter => {
                AuthError::Validation("Password contains invalid characters".into())
            }
        })?;

        Ok(Self(clear_text))
    }

    pub(crate) fn inner(&self) -> &ClearTextPassword {
        &self.0
    }
}

impl fmt::Debug for RawPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RawPassword").field(&"[REDACTED]").finish()
    }
}

/// Hashed password for storage, in PHC string format
#[derive(Clone, PartialEq, Eq)]
pub struct UserPassword(HashedPassword);

impl UserPassword {
    /// Hash a raw password with a fresh salt
    pub fn from_raw(raw: &RawPassword, cost: &HashCost, pepper: Option<&[u8]>) -> AuthResult<Self> {
        let hashed = raw.inner().hash(cost, pepper).map_err(|e| match e {
            PasswordHashError::HashingFailed(msg) | PasswordHashError::InvalidCost(msg) => {
                AuthError::Unexpected(format!("Password hashing failed: {}", msg))
            }
            PasswordHashError::InvalidHashFormat => {
                AuthError::Unexpected("Unexpected error during password hashing".into())
            }
        })?;

        Ok(Self(hashed))
    }

    /// Restore from a stored PHC string
    pub fn from_phc_string(phc_string: impl Into<String>) -> AuthResult<Self> {
        let hashed = HashedPassword::from_phc_string(phc_string)
            .map_err(|_| AuthError::Unexpected("Invalid password hash in database".into()))?;

        Ok(Self(hashed))
    }

    pub fn as_phc_string(&self) -> &str {
        self.0.as_phc_string()
    }

    /// Verify a raw password against this hash
    ///
    /// A malformed stored hash never verifies.
    pub fn verify(&self, raw: &RawPassword, pepper: Option<&[u8]>) -> bool {
        self.0.verify(raw.inner(), pepper)
    }

    /// Whether the stored hash was produced with different parameters
    pub fn needs_rehash(&self, cost: &HashCost) -> bool {
        self.0.needs_rehash(cost)
    }
}

impl fmt::Debug for UserPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserPassword")
            .field("hash", &"[HASH]")
            .finish()
    }
}
