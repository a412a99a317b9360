//! Auth (Identity & Access) Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Entities, value objects, repository and mailer traits
//! - `application/` - Configuration, token codec, use cases
//! - `infra/` - PostgreSQL and in-memory stores, mail transports
//! - `presentation/` - HTTP handlers, DTOs, authenticator, guard, router
//!
//! ## Features
//! - Account creation with email + password and a role (Client, Owner, Delivery)
//! - Login issuing an HMAC-signed bearer token
//! - Single-use email verification codes, reissued on email change
//! - Profile edits guarded by optimistic concurrency
//!
//! ## Security Model
//! - Passwords hashed with Argon2id before any write
//! - Tokens read from a configurable header (`x-jwt` by default)
//! - Login failures do not reveal whether an email is registered

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

#[cfg(test)]
mod tests;

// Re-exports for convenience
pub use application::config::{AuthConfig, MailConfig};
pub use application::token::TokenCodec;
pub use error::{AuthError, AuthResult};
pub use infra::{mail::AppMailer, memory::MemoryAuthRepository, postgres::PgAuthRepository};
pub use presentation::router::{auth_router, auth_router_generic};

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

pub mod models {
    pub use crate::domain::entity::*;
    pub use crate::domain::value_object::*;
    pub use crate::presentation::dto::*;
}
