//! API DTOs (Data Transfer Objects)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::application::MailDispatch;
use crate::domain::entity::identity::Identity;
use crate::domain::value_object::user_role::UserRole;

// ============================================================================
// Identity
// ============================================================================

/// Public view of an identity (never carries the password hash)
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityResponse {
    pub id: i64,
    pub email: String,
    pub role: UserRole,
    pub verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Identity> for IdentityResponse {
    fn from(identity: Identity) -> Self {
        Self {
            id: identity.id.as_i64(),
            email: identity.email.as_str().to_string(),
            role: identity.role,
            verified: identity.verified,
            created_at: identity.created_at,
            updated_at: identity.updated_at,
        }
    }
}

// ============================================================================
// Create Account
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAccountRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub role: UserRole,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAccountResponse {
    pub identity: IdentityResponse,
    pub verification_mail: MailDispatch,
}

// ============================================================================
// Login
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub identity_id: i64,
}

// ============================================================================
// Verify Email
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyEmailRequest {
    pub code: String,
}

// ============================================================================
// Edit Profile
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditProfileRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditProfileResponse {
    pub identity: IdentityResponse,
    /// Present only when the email changed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification_mail: Option<MailDispatch>,
}
