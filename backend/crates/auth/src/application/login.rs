//! Login Use Case
//!
//! Checks credentials and issues a token.

use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::application::token::TokenCodec;
use crate::domain::repository::IdentityRepository;
use crate::domain::value_object::{
    email::Email,
    identity_id::IdentityId,
    user_password::{RawPassword, UserPassword},
};
use crate::error::{AuthError, AuthResult};

/// Login input
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

/// Login output
#[derive(Debug)]
pub struct LoginOutput {
    pub token: String,
    pub identity_id: IdentityId,
}

/// Login use case
///
/// Distinguishes `NotFound` from `InvalidCredential`; the HTTP layer
/// collapses the two.
pub struct LoginUseCase<R>
where
    R: IdentityRepository,
{
    repo: Arc<R>,
    tokens: Arc<TokenCodec>,
    config: Arc<AuthConfig>,
}

impl<R> LoginUseCase<R>
where
    R: IdentityRepository,
{
    pub fn new(repo: Arc<R>, tokens: Arc<TokenCodec>, config: Arc<AuthConfig>) -> Self {
        Self {
            repo,
            tokens,
            config,
        }
    }

    pub async fn execute(&self, input: LoginInput) -> AuthResult<LoginOutput> {
        // No stored identity can carry a malformed email
        let email = Email::new(input.email).map_err(|_| AuthError::NotFound)?;

        let Some(identity) = self.repo.find_by_email(&email).await? else {
            self.spend_hash_cost(input.password);
            return Err(AuthError::NotFound);
        };

        let raw_password =
            RawPassword::new(input.password).map_err(|_| AuthError::InvalidCredential)?;

        let password_hash = self
            .repo
            .find_password_hash(identity.id)
            .await?
            .ok_or(AuthError::NotFound)?;

        if !password_hash.verify(&raw_password, self.config.pepper()) {
            tracing::warn!(identity_id = %identity.id, "Password mismatch");
            return Err(AuthError::InvalidCredential);
        }

        if password_hash.needs_rehash(&self.config.password_cost) {
            tracing::debug!(identity_id = %identity.id, "Stored hash uses outdated cost");
        }

        let token = self.tokens.issue(identity.id)?;

        tracing::info!(identity_id = %identity.id, "Identity logged in");

        Ok(LoginOutput {
            token,
            identity_id: identity.id,
        })
    }

    /// Hash the submitted password with the configured cost and discard it
    ///
    /// An unknown email then takes as long as a password mismatch.
    fn spend_hash_cost(&self, password: String) {
        if let Ok(raw_password) = RawPassword::new(password) {
            let _ = UserPassword::from_raw(
                &raw_password,
                &self.config.password_cost,
                self.config.pepper(),
            );
        }
    }
}
