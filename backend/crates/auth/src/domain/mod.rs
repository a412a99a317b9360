//! Domain Layer
//!
//! Contains entities, value objects, and the repository and mailer traits.

pub mod entity;
pub mod mailer;
pub mod repository;
pub mod value_object;

// Re-exports
pub use entity::{identity::Identity, verification::Verification};
pub use mailer::Mailer;
pub use repository::{IdentityRepository, VerificationRepository};
