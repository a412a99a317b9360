//! Mail Collaborator
//!
//! Outbound mail is a port like the repositories; the transport lives in
//! `infra::mail`.

use crate::domain::value_object::{email::Email, verification_code::VerificationCode};
use crate::error::AuthResult;

#[trait_variant::make(Mailer: Send)]
pub trait LocalMailer {
    /// Deliver a verification code to `to`
    async fn send_verification_email(&self, to: &Email, code: &VerificationCode)
    -> AuthResult<()>;
}
