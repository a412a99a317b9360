//! Verification Mail
//!
//! Issues a fresh code for an identity and hands it to the mailer.
//! Delivery failures are reported, never rolled back.

use serde::Serialize;

use crate::domain::entity::{identity::Identity, verification::Verification};
use crate::domain::mailer::Mailer;
use crate::domain::repository::VerificationRepository;
use crate::domain::value_object::verification_code::VerificationCode;
use crate::error::AuthResult;

/// Outcome of handing a verification code to the mailer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason")]
pub enum MailDispatch {
    Sent,
    Failed(String),
}

impl MailDispatch {
    pub fn is_sent(&self) -> bool {
        matches!(self, MailDispatch::Sent)
    }
}

/// Store a new pending verification (superseding any earlier one) and mail it
pub(crate) async fn issue_verification<R, M>(
    repo: &R,
    mailer: &M,
    identity: &Identity,
) -> AuthResult<MailDispatch>
where
    R: VerificationRepository,
    M: Mailer,
{
    let code = VerificationCode::generate();
    let verification = repo.insert_verification(identity.id, &code).await?;

    Ok(send_verification(mailer, identity, &verification).await)
}

/// Mail an already stored verification to the identity's current email
pub(crate) async fn send_verification<M>(
    mailer: &M,
    identity: &Identity,
    verification: &Verification,
) -> MailDispatch
where
    M: Mailer,
{
    match mailer
        .send_verification_email(&identity.email, &verification.code)
        .await
    {
        Ok(()) => {
            tracing::info!(
                identity_id = %identity.id,
                verification_id = %verification.id,
                "Verification email sent"
            );
            MailDispatch::Sent
        }
        Err(e) => {
            tracing::warn!(
                identity_id = %identity.id,
                verification_id = %verification.id,
                error = %e,
                "Verification email could not be delivered"
            );
            MailDispatch::Failed(e.to_string())
        }
    }
}
