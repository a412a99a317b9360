//! Verify Email Use Case
//!
//! Consumes a verification code and marks its identity verified in one
//! store write. A failed attempt leaves the code pending.

use std::sync::Arc;

use crate::domain::entity::identity::Identity;
use crate::domain::repository::VerificationRepository;
use crate::domain::value_object::verification_code::VerificationCode;
use crate::error::{AuthError, AuthResult};

pub struct VerifyEmailUseCase<R>
where
    R: VerificationRepository,
{
    repo: Arc<R>,
}

impl<R> VerifyEmailUseCase<R>
where
    R: VerificationRepository,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    pub async fn execute(&self, code: &str) -> AuthResult<Identity> {
        let code = VerificationCode::parse(code)?;

        // Email changes drop pending codes, so a code that still exists
        // belongs to the identity's current email
        let identity = self
            .repo
            .consume_and_verify(&code)
            .await?
            .ok_or(AuthError::VerificationNotFound)?;

        tracing::info!(identity_id = %identity.id, "Email verified");
        Ok(identity)
    }
}
