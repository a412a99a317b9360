//! Access Guard
//!
//! Refuses protected operations unless the authenticator attached an
//! identity. Never looks at tokens itself.

use axum::extract::FromRequestParts;
use axum::http::Extensions;
use axum::http::request::Parts;

use crate::domain::entity::identity::Identity;
use crate::error::{AuthError, AuthResult};

/// Identity attached to the request by `attach_identity`
#[derive(Debug, Clone)]
pub struct AuthenticatedIdentity(pub Identity);

/// Resolve the caller from request extensions
pub fn check(extensions: &Extensions) -> AuthResult<Identity> {
    extensions
        .get::<AuthenticatedIdentity>()
        .map(|attached| attached.0.clone())
        .ok_or(AuthError::Unauthorized)
}

/// Extractor for protected handlers
///
/// Rejects with `401 Unauthorized` when no identity is attached.
#[derive(Debug, Clone)]
pub struct CurrentIdentity(pub Identity);

impl<S> FromRequestParts<S> for CurrentIdentity
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        check(&parts.extensions).map(CurrentIdentity)
    }
}
