//! Create Account Use Case
//!
//! Registers a new identity and sends its first verification code.

use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::application::verification_mail::{MailDispatch, issue_verification};
use crate::domain::entity::identity::{Identity, NewIdentity};
use crate::domain::mailer::Mailer;
use crate::domain::repository::{IdentityRepository, VerificationRepository};
use crate::domain::value_object::{
    email::Email,
    user_password::{RawPassword, UserPassword},
    user_role::UserRole,
};
use crate::error::{AuthError, AuthResult};

/// Create account input
pub struct CreateAccountInput {
    pub email: String,
    pub password: String,
    pub role: UserRole,
}

/// Create account output
#[derive(Debug)]
pub struct CreateAccountOutput {
    pub identity: Identity,
    pub verification_mail: MailDispatch,
}

/// Create account use case
pub struct CreateAccountUseCase<R, M>
where
    R: IdentityRepository + VerificationRepository,
    M: Mailer,
{
    repo: Arc<R>,
    mailer: Arc<M>,
    config: Arc<AuthConfig>,
}

impl<R, M> CreateAccountUseCase<R, M>
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

    pub async fn execute(&self, input: CreateAccountInput) -> AuthResult<CreateAccountOutput> {
        let email = Email::new(input.email)?;
        let raw_password = RawPassword::new(input.password)?;

        if self.repo.find_by_email(&email).await?.is_some() {
            tracing::debug!(email_domain = %email.domain(), "Email already registered");
            return Err(AuthError::DuplicateEmail);
        }

        let password_hash = UserPassword::from_raw(
            &raw_password,
            &self.config.password_cost,
            self.config.pepper(),
        )?;

        // A concurrent insert that wins the unique index surfaces as DuplicateEmail here
        let identity = self
            .repo
            .insert_identity(&NewIdentity {
                email,
                password_hash,
                role: input.role,
            })
            .await?;

        tracing::info!(
            identity_id = %identity.id,
            role = %identity.role,
            "Account created"
        );

        let verification_mail =
            issue_verification(self.repo.as_ref(), self.mailer.as_ref(), &identity).await?;

        Ok(CreateAccountOutput {
            identity,
            verification_mail,
        })
    }
}
