//! HTTP Handlers

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use std::sync::Arc;

use crate::application::config::AuthConfig;
use crate::application::{
    CreateAccountInput, CreateAccountUseCase, EditProfileInput, EditProfileUseCase,
    FindIdentityUseCase, LoginInput, LoginUseCase, TokenCodec, VerifyEmailUseCase,
};
use crate::domain::mailer::Mailer;
use crate::domain::repository::{IdentityRepository, VerificationRepository};
use crate::domain::value_object::identity_id::IdentityId;
use crate::error::{AuthError, AuthResult};
use crate::presentation::dto::{
    CreateAccountRequest, CreateAccountResponse, EditProfileRequest, EditProfileResponse,
    IdentityResponse, LoginRequest, LoginResponse, VerifyEmailRequest,
};
use crate::presentation::guard::CurrentIdentity;

/// Shared state for auth handlers
#[derive(Clone)]
pub struct AuthAppState<R, M>
where
    R: IdentityRepository + VerificationRepository + Clone + Send + Sync + 'static,
    M: Mailer + Clone + Send + Sync + 'static,
{
    pub repo: Arc<R>,
    pub mailer: Arc<M>,
    pub config: Arc<AuthConfig>,
    pub tokens: Arc<TokenCodec>,
}

impl<R, M> AuthAppState<R, M>
where
    R: IdentityRepository + VerificationRepository + Clone + Send + Sync + 'static,
    M: Mailer + Clone + Send + Sync + 'static,
{
    pub fn new(repo: R, mailer: M, config: AuthConfig) -> Self {
        let tokens = TokenCodec::from_config(&config);
        Self {
            repo: Arc::new(repo),
            mailer: Arc::new(mailer),
            config: Arc::new(config),
            tokens: Arc::new(tokens),
        }
    }
}

// ============================================================================
// Create Account
// ============================================================================

/// POST /api/auth/accounts
pub async fn create_account<R, M>(
    State(state): State<AuthAppState<R, M>>,
    Json(req): Json<CreateAccountRequest>,
) -> AuthResult<impl IntoResponse>
where
    R: IdentityRepository + VerificationRepository + Clone + Send + Sync + 'static,
    M: Mailer + Clone + Send + Sync + 'static,
{
    let use_case = CreateAccountUseCase::new(
        state.repo.clone(),
        state.mailer.clone(),
        state.config.clone(),
    );

    let output = use_case
        .execute(CreateAccountInput {
            email: req.email,
            password: req.password,
            role: req.role,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateAccountResponse {
            identity: output.identity.into(),
            verification_mail: output.verification_mail,
        }),
    ))
}

// ============================================================================
// Login
// ============================================================================

/// POST /api/auth/login
pub async fn login<R, M>(
    State(state): State<AuthAppState<R, M>>,
    Json(req): Json<LoginRequest>,
) -> AuthResult<Json<LoginResponse>>
where
    R: IdentityRepository + VerificationRepository + Clone + Send + Sync + 'static,
    M: Mailer + Clone + Send + Sync + 'static,
{
    let use_case = LoginUseCase::new(
        state.repo.clone(),
        state.tokens.clone(),
        state.config.clone(),
    );

    let output = use_case
        .execute(LoginInput {
            email: req.email,
            password: req.password,
        })
        .await
        .map_err(AuthError::collapse_login)?;

    Ok(Json(LoginResponse {
        token: output.token,
        identity_id: output.identity_id.as_i64(),
    }))
}

// ============================================================================
// Verify Email
// ============================================================================

/// POST /api/auth/verify-email
pub async fn verify_email<R, M>(
    State(state): State<AuthAppState<R, M>>,
    Json(req): Json<VerifyEmailRequest>,
) -> AuthResult<Json<IdentityResponse>>
where
    R: IdentityRepository + VerificationRepository + Clone + Send + Sync + 'static,
    M: Mailer + Clone + Send + Sync + 'static,
{
    let identity = VerifyEmailUseCase::new(state.repo.clone())
        .execute(&req.code)
        .await?;

    Ok(Json(identity.into()))
}

// ============================================================================
// Current Identity
// ============================================================================

/// GET /api/auth/me
pub async fn me(CurrentIdentity(identity): CurrentIdentity) -> Json<IdentityResponse> {
    Json(identity.into())
}

/// PATCH /api/auth/me
pub async fn edit_profile<R, M>(
    State(state): State<AuthAppState<R, M>>,
    CurrentIdentity(identity): CurrentIdentity,
    Json(req): Json<EditProfileRequest>,
) -> AuthResult<Json<EditProfileResponse>>
where
    R: IdentityRepository + VerificationRepository + Clone + Send + Sync + 'static,
    M: Mailer + Clone + Send + Sync + 'static,
{
    let use_case = EditProfileUseCase::new(
        state.repo.clone(),
        state.mailer.clone(),
        state.config.clone(),
    );

    let output = use_case
        .execute(
            identity.id,
            EditProfileInput {
                email: req.email,
                password: req.password,
            },
        )
        .await?;

    Ok(Json(EditProfileResponse {
        identity: output.identity.into(),
        verification_mail: output.verification_mail,
    }))
}

// ============================================================================
// Identity Profile
// ============================================================================

/// GET /api/auth/identities/{id}
pub async fn identity_profile<R, M>(
    State(state): State<AuthAppState<R, M>>,
    _caller: CurrentIdentity,
    Path(id): Path<String>,
) -> AuthResult<Json<IdentityResponse>>
where
    R: IdentityRepository + VerificationRepository + Clone + Send + Sync + 'static,
    M: Mailer + Clone + Send + Sync + 'static,
{
    let id: IdentityId = id.parse()?;

    let identity = FindIdentityUseCase::new(state.repo.clone())
        .execute(id)
        .await?;

    Ok(Json(identity.into()))
}
