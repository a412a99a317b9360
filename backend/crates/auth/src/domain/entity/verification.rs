//! Verification Entity
//!
//! A pending, single-use email verification. At most one exists per identity.

use chrono::{DateTime, Utc};

use crate::domain::value_object::{
    identity_id::{IdentityId, VerificationId},
    verification_code::VerificationCode,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verification {
    pub id: VerificationId,
    pub code: VerificationCode,
    pub identity_id: IdentityId,
    pub created_at: DateTime<Utc>,
}
