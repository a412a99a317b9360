//! PostgreSQL Repository Implementations

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};

use crate::domain::entity::{
    identity::{Identity, IdentityChanges, NewIdentity},
    verification::Verification,
};
use crate::domain::repository::{IdentityRepository, VerificationRepository};
use crate::domain::value_object::{
    email::Email,
    identity_id::{IdentityId, VerificationId},
    user_password::UserPassword,
    user_role::UserRole,
    verification_code::VerificationCode,
};
use crate::error::{AuthError, AuthResult};

/// PostgreSQL-backed identity and verification store
#[derive(Clone)]
pub struct PgAuthRepository {
    pool: PgPool,
}

impl PgAuthRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Map a unique-index violation to `DuplicateEmail`
fn map_unique_email(err: sqlx::Error) -> AuthError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => AuthError::DuplicateEmail,
        _ => AuthError::Database(err),
    }
}

/// Version-checked identity update; an email change also drops pending codes
///
/// Verifications are locked before the identity row, matching
/// `consume_and_verify`.
async fn apply_changes(
    conn: &mut PgConnection,
    id: IdentityId,
    expected_version: i32,
    changes: &IdentityChanges,
) -> AuthResult<bool> {
    if changes.changes_email() {
        sqlx::query("DELETE FROM verifications WHERE identity_id = $1")
            .bind(id.as_i64())
            .execute(&mut *conn)
            .await?;
    }

    let result = sqlx::query(
        r#"
        UPDATE identities SET
            email = COALESCE($3, email),
            password_hash = COALESCE($4, password_hash),
            verified = COALESCE($5, verified),
            version = version + 1,
            updated_at = NOW()
        WHERE identity_id = $1 AND version = $2
        "#,
    )
    .bind(id.as_i64())
    .bind(expected_version)
    .bind(changes.email.as_ref().map(|e| e.as_str()))
    .bind(changes.password_hash.as_ref().map(|p| p.as_phc_string()))
    .bind(changes.verified)
    .execute(&mut *conn)
    .await
    .map_err(map_unique_email)?;

    Ok(result.rows_affected() == 1)
}

/// Replace the identity's pending verification with `code`
async fn replace_verification(
    conn: &mut PgConnection,
    identity_id: IdentityId,
    code: &VerificationCode,
) -> AuthResult<Verification> {
    let superseded = sqlx::query("DELETE FROM verifications WHERE identity_id = $1")
        .bind(identity_id.as_i64())
        .execute(&mut *conn)
        .await?
        .rows_affected();

    let row = sqlx::query_as::<_, VerificationRow>(
        r#"
        INSERT INTO verifications (code, identity_id)
        VALUES ($1, $2)
        RETURNING
            verification_id,
            code,
            identity_id,
            created_at
        "#,
    )
    .bind(code.as_str())
    .bind(identity_id.as_i64())
    .fetch_one(&mut *conn)
    .await?;

    if superseded > 0 {
        tracing::debug!(identity_id = %identity_id, "Superseded pending verification");
    }

    Ok(row.into_verification())
}

// ============================================================================
// Identity Repository Implementation
// ============================================================================

impl IdentityRepository for PgAuthRepository {
    async fn find_by_id(&self, id: IdentityId) -> AuthResult<Option<Identity>> {
        let row = sqlx::query_as::<_, IdentityRow>(
            r#"
            SELECT
                identity_id,
                email,
                user_role,
                verified,
                version,
                created_at,
                updated_at
            FROM identities
            WHERE identity_id = $1
            "#,
        )
        .bind(id.as_i64())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_identity()).transpose()
    }

    async fn find_by_email(&self, email: &Email) -> AuthResult<Option<Identity>> {
        let row = sqlx::query_as::<_, IdentityRow>(
            r#"
            SELECT
                identity_id,
                email,
                user_role,
                verified,
                version,
                created_at,
                updated_at
            FROM identities
            WHERE email = $1
            "#,
        )
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_identity()).transpose()
    }

    async fn find_password_hash(&self, id: IdentityId) -> AuthResult<Option<UserPassword>> {
        let hash = sqlx::query_scalar::<_, String>(
            "SELECT password_hash FROM identities WHERE identity_id = $1",
        )
        .bind(id.as_i64())
        .fetch_optional(&self.pool)
        .await?;

        hash.map(UserPassword::from_phc_string).transpose()
    }

    async fn insert_identity(&self, identity: &NewIdentity) -> AuthResult<Identity> {
        let row = sqlx::query_as::<_, IdentityRow>(
            r#"
            INSERT INTO identities (
                email,
                password_hash,
                user_role,
                verified
            ) VALUES ($1, $2, $3, FALSE)
            RETURNING
                identity_id,
                email,
                user_role,
                verified,
                version,
                created_at,
                updated_at
            "#,
        )
        .bind(identity.email.as_str())
        .bind(identity.password_hash.as_phc_string())
        .bind(identity.role.id())
        .fetch_one(&self.pool)
        .await
        .map_err(map_unique_email)?;

        row.into_identity()
    }

    async fn update_identity(
        &self,
        id: IdentityId,
        expected_version: i32,
        changes: &IdentityChanges,
    ) -> AuthResult<bool> {
        let mut tx = self.pool.begin().await?;

        if !apply_changes(&mut *tx, id, expected_version, changes).await? {
            tx.rollback().await?;
            return Ok(false);
        }

        tx.commit().await?;
        Ok(true)
    }
}

// ============================================================================
// Verification Repository Implementation
// ============================================================================

impl VerificationRepository for PgAuthRepository {
    async fn insert_verification(
        &self,
        identity_id: IdentityId,
        code: &VerificationCode,
    ) -> AuthResult<Verification> {
        let mut tx = self.pool.begin().await?;
        let verification = replace_verification(&mut *tx, identity_id, code).await?;
        tx.commit().await?;

        Ok(verification)
    }

    async fn change_email(
        &self,
        id: IdentityId,
        expected_version: i32,
        changes: &IdentityChanges,
        code: &VerificationCode,
    ) -> AuthResult<Option<Verification>> {
        let mut tx = self.pool.begin().await?;

        if !apply_changes(&mut *tx, id, expected_version, changes).await? {
            tx.rollback().await?;
            return Ok(None);
        }
        let verification = replace_verification(&mut *tx, id, code).await?;

        tx.commit().await?;
        Ok(Some(verification))
    }

    async fn consume_and_verify(&self, code: &VerificationCode) -> AuthResult<Option<Identity>> {
        let mut tx = self.pool.begin().await?;

        // Row lock on the code serializes concurrent callers
        let consumed = sqlx::query_as::<_, VerificationRow>(
            r#"
            DELETE FROM verifications
            WHERE code = $1
            RETURNING
                verification_id,
                code,
                identity_id,
                created_at
            "#,
        )
        .bind(code.as_str())
        .fetch_optional(&mut *tx)
        .await?;

        let Some(verification) = consumed.map(VerificationRow::into_verification) else {
            tx.rollback().await?;
            return Ok(None);
        };

        let row = sqlx::query_as::<_, IdentityRow>(
            r#"
            UPDATE identities SET
                verified = TRUE,
                version = version + 1,
                updated_at = NOW()
            WHERE identity_id = $1
            RETURNING
                identity_id,
                email,
                user_role,
                verified,
                version,
                created_at,
                updated_at
            "#,
        )
        .bind(verification.identity_id.as_i64())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(verification_id = %verification.id, "Verification consumed");
        row.into_identity().map(Some)
    }
}

// ============================================================================
// Row Types
// ============================================================================

#[derive(sqlx::FromRow)]
struct IdentityRow {
    identity_id: i64,
    email: String,
    user_role: i16,
    verified: bool,
    version: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl IdentityRow {
    fn into_identity(self) -> AuthResult<Identity> {
        Ok(Identity {
            id: IdentityId::from_i64(self.identity_id),
            email: Email::from_db(self.email),
            role: UserRole::try_from(self.user_role)?,
            verified: self.verified,
            version: self.version,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct VerificationRow {
    verification_id: i64,
    code: String,
    identity_id: i64,
    created_at: DateTime<Utc>,
}

impl VerificationRow {
    fn into_verification(self) -> Verification {
        Verification {
            id: VerificationId::from_i64(self.verification_id),
            code: VerificationCode::from_db(self.code),
            identity_id: IdentityId::from_i64(self.identity_id),
            created_at: self.created_at,
        }
    }
}
