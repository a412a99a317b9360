//! Request Authenticator
//!
//! Runs before every route. A valid token attaches the identity to the
//! request extensions; anything else leaves the request unauthenticated.

use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;

use crate::application::FindIdentityUseCase;
use crate::domain::entity::identity::Identity;
use crate::domain::mailer::Mailer;
use crate::domain::repository::{IdentityRepository, VerificationRepository};
use crate::presentation::guard::AuthenticatedIdentity;
use crate::presentation::handlers::AuthAppState;

/// Middleware that opportunistically resolves the caller
pub async fn attach_identity<R, M>(
    State(state): State<AuthAppState<R, M>>,
    mut req: Request,
    next: Next,
) -> Response
where
    R: IdentityRepository + VerificationRepository + Clone + Send + Sync + 'static,
    M: Mailer + Clone + Send + Sync + 'static,
{
    let identity = resolve_identity(&state, req.headers()).await;

    if let Some(identity) = identity {
        req.extensions_mut().insert(AuthenticatedIdentity(identity));
    }

    next.run(req).await
}

async fn resolve_identity<R, M>(state: &AuthAppState<R, M>, headers: &HeaderMap) -> Option<Identity>
where
    R: IdentityRepository + VerificationRepository + Clone + Send + Sync + 'static,
    M: Mailer + Clone + Send + Sync + 'static,
{
    let value = headers.get(state.config.token_header.as_str())?;

    let token = match value.to_str() {
        Ok(token) => token.trim(),
        Err(_) => {
            tracing::debug!("Ignoring non-ASCII token header");
            return None;
        }
    };

    let identity_id = match state.tokens.verify(token) {
        Ok(id) => id,
        Err(e) => {
            tracing::debug!(error = %e, "Ignoring invalid token");
            return None;
        }
    };

    match FindIdentityUseCase::new(state.repo.clone())
        .execute(identity_id)
        .await
    {
        Ok(identity) => Some(identity),
        Err(e) => {
            tracing::debug!(identity_id = %identity_id, error = %e, "Token subject not resolved");
            None
        }
    }
}
