//! Repository Traits
//!
//! Interfaces for data persistence. Implementation is in infrastructure layer.

use crate::domain::entity::{
    identity::{Identity, IdentityChanges, NewIdentity},
    verification::Verification,
};
use crate::domain::value_object::{
    email::Email, identity_id::IdentityId, user_password::UserPassword,
    verification_code::VerificationCode,
};
use crate::error::AuthResult;

/// Identity repository trait
#[trait_variant::make(IdentityRepository: Send)]
pub trait LocalIdentityRepository {
    /// Find identity by ID
    async fn find_by_id(&self, id: IdentityId) -> AuthResult<Option<Identity>>;

    /// Find identity by exact email
    async fn find_by_email(&self, email: &Email) -> AuthResult<Option<Identity>>;

    /// Load the stored password hash for an identity
    async fn find_password_hash(&self, id: IdentityId) -> AuthResult<Option<UserPassword>>;

    /// Persist a new identity
    ///
    /// Returns `AuthError::DuplicateEmail` when the email is already taken,
    /// including when a concurrent insert wins the race.
    async fn insert_identity(&self, identity: &NewIdentity) -> AuthResult<Identity>;

    /// Apply `changes` only if the stored version still equals `expected_version`
    ///
    /// Returns `Ok(false)` when the version moved on (or the identity is gone).
    /// An email change drops the identity's pending verifications in the same
    /// write.
    async fn update_identity(
        &self,
        id: IdentityId,
        expected_version: i32,
        changes: &IdentityChanges,
    ) -> AuthResult<bool>;
}

/// Verification repository trait
#[trait_variant::make(VerificationRepository: Send)]
pub trait LocalVerificationRepository {
    /// Store a pending verification, replacing any earlier one for the identity
    async fn insert_verification(
        &self,
        identity_id: IdentityId,
        code: &VerificationCode,
    ) -> AuthResult<Verification>;

    /// Apply an email change and store `code` as the only pending verification
    ///
    /// Both happen in one write or not at all. Returns `Ok(None)` when the
    /// version moved on (or the identity is gone).
    async fn change_email(
        &self,
        id: IdentityId,
        expected_version: i32,
        changes: &IdentityChanges,
        code: &VerificationCode,
    ) -> AuthResult<Option<Verification>>;

    /// Remove a verification by code and mark its identity verified
    ///
    /// Both happen in one write or not at all. Only one concurrent caller
    /// observes `Some`.
    async fn consume_and_verify(&self, code: &VerificationCode) -> AuthResult<Option<Identity>>;
}
