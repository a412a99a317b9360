//! Edit Profile Use Case
//!
//! Changes email and/or password. An email change resets `verified` and
//! replaces the pending code in the same store write; the mail goes out
//! only after that write lands. Writes are compare-and-set on the identity
//! version.

use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::application::verification_mail::{MailDispatch, send_verification};
use crate::domain::entity::identity::Identity;
use crate::domain::mailer::Mailer;
use crate::domain::repository::{IdentityRepository, VerificationRepository};
use crate::domain::value_object::{
    email::Email,
    identity_id::IdentityId,
    user_password::{RawPassword, UserPassword},
    verification_code::VerificationCode,
};
use crate::error::{AuthError, AuthResult};

/// Attempts before giving up on a contended identity
const MAX_EDIT_ATTEMPTS: usize = 3;

/// Edit profile input; absent fields are left unchanged
#[derive(Default)]
pub struct EditProfileInput {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Edit profile output
#[derive(Debug)]
pub struct EditProfileOutput {
    pub identity: Identity,
    /// Present only when the email changed
    pub verification_mail: Option<MailDispatch>,
}

/// Edit profile use case
pub struct EditProfileUseCase<R, M>
where
    R: IdentityRepository + VerificationRepository,
    M: Mailer,
{
    repo: Arc<R>,
    mailer: Arc<M>,
    config: Arc<AuthConfig>,
}

impl<R, M> EditProfileUseCase<R, M>
where
    R: IdentityRepository + VerificationRepository,
    M: Mailer,
{
    pub fn new(repo: Arc<R>, mailer: Arc<M>, config: Arc<AuthConfig>) -> Self {
        Self {
            repo,
            mailer,
            config,
        }
    }

    pub async fn execute(
        &self,
        id: IdentityId,
        input: EditProfileInput,
    ) -> AuthResult<EditProfileOutput> {
        let email = input.email.map(Email::new).transpose()?;

        // Hashed once, before any write path sees it
        let password_hash = match input.password {
            Some(password) => {
                let raw_password = RawPassword::new(password)?;
                Some(UserPassword::from_raw(
                    &raw_password,
                    &self.config.password_cost,
                    self.config.pepper(),
                )?)
            }
            None => None,
        };

        for attempt in 1..=MAX_EDIT_ATTEMPTS {
            let current = self
                .repo
                .find_by_id(id)
                .await?
                .ok_or(AuthError::NotFound)?;

            let changes = current.changes_for(email.clone(), password_hash.clone());
            if changes.is_empty() {
                return Ok(EditProfileOutput {
                    identity: current,
                    verification_mail: None,
                });
            }

            if let Some(new_email) = &changes.email {
                if self.repo.find_by_email(new_email).await?.is_some() {
                    return Err(AuthError::DuplicateEmail);
                }
            }

            let verification = if changes.changes_email() {
                let code = VerificationCode::generate();
                match self
                    .repo
                    .change_email(id, current.version, &changes, &code)
                    .await?
                {
                    Some(verification) => Some(verification),
                    None => {
                        tracing::debug!(
                            identity_id = %id,
                            attempt,
                            "Email change lost version race"
                        );
                        continue;
                    }
                }
            } else {
                if !self
                    .repo
                    .update_identity(id, current.version, &changes)
                    .await?
                {
                    tracing::debug!(identity_id = %id, attempt, "Profile edit lost version race");
                    continue;
                }
                None
            };

            let identity = self
                .repo
                .find_by_id(id)
                .await?
                .ok_or(AuthError::NotFound)?;

            tracing::info!(
                identity_id = %id,
                email_changed = changes.changes_email(),
                password_changed = changes.password_hash.is_some(),
                "Profile edited"
            );

            let verification_mail = match &verification {
                Some(verification) => {
                    Some(send_verification(self.mailer.as_ref(), &identity, verification).await)
                }
                None => None,
            };

            return Ok(EditProfileOutput {
                identity,
                verification_mail,
            });
        }

        Err(AuthError::EditConflict)
    }
}
