//! In-Memory Repository
//!
//! Same contract as the PostgreSQL store; every operation runs inside one
//! critical section. Used by tests and by local runs without a database.

use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::domain::entity::{
    identity::{Identity, IdentityChanges, NewIdentity},
    verification::Verification,
};
use crate::domain::repository::{IdentityRepository, VerificationRepository};
use crate::domain::value_object::{
    email::Email,
    identity_id::{IdentityId, VerificationId},
    user_password::UserPassword,
    verification_code::VerificationCode,
};
use crate::error::{AuthError, AuthResult};

struct StoredIdentity {
    identity: Identity,
    password_hash: UserPassword,
}

#[derive(Default)]
struct State {
    next_identity_id: i64,
    next_verification_id: i64,
    identities: HashMap<IdentityId, StoredIdentity>,
    /// Keyed by code
    verifications: HashMap<String, Verification>,
}

impl State {
    fn email_taken(&self, email: &Email, except: Option<IdentityId>) -> bool {
        self.identities
            .values()
            .any(|s| s.identity.email == *email && Some(s.identity.id) != except)
    }

    fn apply_changes(
        &mut self,
        id: IdentityId,
        expected_version: i32,
        changes: &IdentityChanges,
    ) -> AuthResult<bool> {
        if let Some(email) = &changes.email {
            if self.email_taken(email, Some(id)) {
                return Err(AuthError::DuplicateEmail);
            }
        }

        let Some(stored) = self.identities.get_mut(&id) else {
            return Ok(false);
        };
        if stored.identity.version != expected_version {
            return Ok(false);
        }

        if let Some(email) = &changes.email {
            stored.identity.email = email.clone();
        }
        if let Some(hash) = &changes.password_hash {
            stored.password_hash = hash.clone();
        }
        if let Some(verified) = changes.verified {
            stored.identity.verified = verified;
        }
        stored.identity.version += 1;
        stored.identity.updated_at = Utc::now();

        if changes.changes_email() {
            self.verifications.retain(|_, v| v.identity_id != id);
        }
        Ok(true)
    }

    /// Replace the identity's pending verification with `code`
    fn replace_verification(
        &mut self,
        identity_id: IdentityId,
        code: &VerificationCode,
    ) -> Verification {
        self.verifications.retain(|_, v| v.identity_id != identity_id);

        self.next_verification_id += 1;
        let verification = Verification {
            id: VerificationId::from_i64(self.next_verification_id),
            code: code.clone(),
            identity_id,
            created_at: Utc::now(),
        };
        self.verifications
            .insert(code.as_str().to_string(), verification.clone());
        verification
    }
}

/// In-memory identity and verification store
#[derive(Clone, Default)]
pub struct MemoryAuthRepository {
    state: Arc<Mutex<State>>,
}

impl MemoryAuthRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored identities and pending verifications
    pub async fn counts(&self) -> (usize, usize) {
        let state = self.state.lock().await;
        (state.identities.len(), state.verifications.len())
    }

    /// Pending verification for an identity, if any
    #[cfg(test)]
    pub(crate) async fn pending_verification(
        &self,
        identity_id: IdentityId,
    ) -> Option<Verification> {
        let state = self.state.lock().await;
        state
            .verifications
            .values()
            .find(|v| v.identity_id == identity_id)
            .cloned()
    }
}

impl IdentityRepository for MemoryAuthRepository {
    async fn find_by_id(&self, id: IdentityId) -> AuthResult<Option<Identity>> {
        let state = self.state.lock().await;
        Ok(state.identities.get(&id).map(|s| s.identity.clone()))
    }

    async fn find_by_email(&self, email: &Email) -> AuthResult<Option<Identity>> {
        let state = self.state.lock().await;
        Ok(state
            .identities
            .values()
            .find(|s| s.identity.email == *email)
            .map(|s| s.identity.clone()))
    }

    async fn find_password_hash(&self, id: IdentityId) -> AuthResult<Option<UserPassword>> {
        let state = self.state.lock().await;
        Ok(state.identities.get(&id).map(|s| s.password_hash.clone()))
    }

    async fn insert_identity(&self, new: &NewIdentity) -> AuthResult<Identity> {
        let mut state = self.state.lock().await;
        if state.email_taken(&new.email, None) {
            return Err(AuthError::DuplicateEmail);
        }

        state.next_identity_id += 1;
        let now = Utc::now();
        let identity = Identity {
            id: IdentityId::from_i64(state.next_identity_id),
            email: new.email.clone(),
            role: new.role,
            verified: false,
            version: 0,
            created_at: now,
            updated_at: now,
        };
        state.identities.insert(
            identity.id,
            StoredIdentity {
                identity: identity.clone(),
                password_hash: new.password_hash.clone(),
            },
        );
        Ok(identity)
    }

    async fn update_identity(
        &self,
        id: IdentityId,
        expected_version: i32,
        changes: &IdentityChanges,
    ) -> AuthResult<bool> {
        let mut state = self.state.lock().await;
        state.apply_changes(id, expected_version, changes)
    }
}

impl VerificationRepository for MemoryAuthRepository {
    async fn insert_verification(
        &self,
        identity_id: IdentityId,
        code: &VerificationCode,
    ) -> AuthResult<Verification> {
        let mut state = self.state.lock().await;
        if !state.identities.contains_key(&identity_id) {
            return Err(AuthError::NotFound);
        }
        Ok(state.replace_verification(identity_id, code))
    }

    async fn change_email(
        &self,
        id: IdentityId,
        expected_version: i32,
        changes: &IdentityChanges,
        code: &VerificationCode,
    ) -> AuthResult<Option<Verification>> {
        let mut state = self.state.lock().await;
        if !state.apply_changes(id, expected_version, changes)? {
            return Ok(None);
        }
        Ok(Some(state.replace_verification(id, code)))
    }

    async fn consume_and_verify(&self, code: &VerificationCode) -> AuthResult<Option<Identity>> {
        let mut state = self.state.lock().await;
        let Some(verification) = state.verifications.remove(code.as_str()) else {
            return Ok(None);
        };
        let Some(stored) = state.identities.get_mut(&verification.identity_id) else {
            return Ok(None);
        };

        stored.identity.verified = true;
        stored.identity.version += 1;
        stored.identity.updated_at = Utc::now();
        Ok(Some(stored.identity.clone()))
    }
}
