//! Identity Entity
//!
//! A registered account. The password hash is deliberately absent: it is
//! only reachable through `IdentityRepository::find_password_hash`.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::value_object::{
    email::Email, identity_id::IdentityId, user_password::UserPassword, user_role::UserRole,
};

/// Identity entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub id: IdentityId,
    pub email: Email,
    pub role: UserRole,
    /// Whether the current email has been confirmed
    pub verified: bool,
    /// Bumped on every write; used for compare-and-swap updates
    #[serde(skip)]
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Identity {
    /// Build the change set for a profile edit
    ///
    /// Supplying the current email again is not a change. A different email
    /// resets `verified`.
    pub fn changes_for(
        &self,
        email: Option<Email>,
        password_hash: Option<UserPassword>,
    ) -> IdentityChanges {
        let email = email.filter(|e| *e != self.email);
        let verified = email.as_ref().map(|_| false);
        IdentityChanges {
            email,
            password_hash,
            verified,
        }
    }
}

/// Data for a not-yet-persisted identity
#[derive(Debug, Clone)]
pub struct NewIdentity {
    pub email: Email,
    pub password_hash: UserPassword,
    pub role: UserRole,
}

/// Partial update applied with a version check
#[derive(Debug, Clone, Default)]
pub struct IdentityChanges {
    pub email: Option<Email>,
    pub password_hash: Option<UserPassword>,
    pub verified: Option<bool>,
}

impl IdentityChanges {
    pub fn is_empty(&self) -> bool {
        self.email.is_none() && self.password_hash.is_none() && self.verified.is_none()
    }

    pub fn changes_email(&self) -> bool {
        self.email.is_some()
    }
}
