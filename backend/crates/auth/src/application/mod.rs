//! Application Layer
//!
//! Use cases and application services.

pub mod config;
pub mod create_account;
pub mod edit_profile;
pub mod find_identity;
pub mod login;
pub mod token;
pub mod verification_mail;
pub mod verify_email;

// Re-exports
pub use config::{AuthConfig, MailConfig};
pub use create_account::{CreateAccountInput, CreateAccountOutput, CreateAccountUseCase};
pub use edit_profile::{EditProfileInput, EditProfileOutput, EditProfileUseCase};
pub use find_identity::FindIdentityUseCase;
pub use login::{LoginInput, LoginOutput, LoginUseCase};
pub use token::TokenCodec;
pub use verification_mail::MailDispatch;
pub use verify_email::VerifyEmailUseCase;
