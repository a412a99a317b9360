//! Auth Router

use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::application::config::AuthConfig;
use crate::domain::mailer::Mailer;
use crate::domain::repository::{IdentityRepository, VerificationRepository};
use crate::infra::mail::AppMailer;
use crate::infra::postgres::PgAuthRepository;
use crate::presentation::handlers::{self, AuthAppState};
use crate::presentation::middleware::attach_identity;

/// Create the Auth router with PostgreSQL repository
pub fn auth_router(repo: PgAuthRepository, mailer: AppMailer, config: AuthConfig) -> Router {
    auth_router_generic(repo, mailer, config)
}

/// Create a generic Auth router for any repository and mailer implementation
///
/// The request authenticator wraps every route.
pub fn auth_router_generic<R, M>(repo: R, mailer: M, config: AuthConfig) -> Router
where
    R: IdentityRepository + VerificationRepository + Clone + Send + Sync + 'static,
    M: Mailer + Clone + Send + Sync + 'static,
{
    let state = AuthAppState::new(repo, mailer, config);

    Router::new()
        .route("/accounts", post(handlers::create_account::<R, M>))
        .route("/login", post(handlers::login::<R, M>))
        .route("/verify-email", post(handlers::verify_email::<R, M>))
        .route(
            "/me",
            get(handlers::me).patch(handlers::edit_profile::<R, M>),
        )
        .route("/identities/{id}", get(handlers::identity_profile::<R, M>))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            attach_identity::<R, M>,
        ))
        .with_state(state)
}
