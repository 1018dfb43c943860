//! Record store contract for identities, plus its PostgreSQL implementation.
//!
//! The auth core never owns identities: it borrows one per operation from an
//! [`IdentityStore`] handle supplied by the caller.

use async_trait::async_trait;
use chrono::NaiveDateTime;
use sqlx::{PgPool, Row, postgres::PgRow};

use crate::auth::{AuthError, AuthResult, Identity, PasswordDigest, UserId};

/// Trait for identity record store operations
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Create a new identity, returning its ID
    ///
    /// Fails with `AuthError::EmailTaken` if the email is already stored.
    async fn create_identity(
        &self,
        email: &str,
        first_name: &str,
        last_name: &str,
        password: &PasswordDigest,
    ) -> AuthResult<UserId>;

    /// Find identity by exact email
    async fn find_by_email(&self, email: &str) -> AuthResult<Option<Identity>>;

    /// Find identity by ID
    async fn find_by_id(&self, user_id: UserId) -> AuthResult<Option<Identity>>;

    /// Write back password hash, profile and activity changes
    async fn persist(&self, identity: &Identity) -> AuthResult<()>;
}

/// PostgreSQL implementation of `IdentityStore`
///
/// Expects the `users` table from `migrations/0001_users.sql`.
#[derive(Clone)]
pub struct PgIdentityStore {
    pool: PgPool,
}

impl PgIdentityStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn identity_from_row(row: &PgRow) -> Result<Identity, sqlx::Error> {
    Ok(Identity {
        id: row.try_get("id")?,
        email: row.try_get("email")?,
        first_name: row.try_get("first_name")?,
        last_name: row.try_get("last_name")?,
        password: PasswordDigest::from_stored(row.try_get::<String, _>("password_hash")?),
        is_active: row.try_get("is_active")?,
        created_at: row.try_get::<NaiveDateTime, _>("created_at")?.and_utc(),
        updated_at: row
            .try_get::<Option<NaiveDateTime>, _>("updated_at")?
            .map(|dt| dt.and_utc()),
    })
}

#[async_trait]
impl IdentityStore for PgIdentityStore {
    async fn create_identity(
        &self,
        email: &str,
        first_name: &str,
        last_name: &str,
        password: &PasswordDigest,
    ) -> AuthResult<UserId> {
        let result = sqlx::query(
            "INSERT INTO users (email, password_hash, first_name, last_name) VALUES ($1, $2, $3, $4) RETURNING id",
        )
        .bind(email)
        .bind(password.as_stored())
        .bind(first_name)
        .bind(last_name)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(row) => Ok(row.try_get("id")?),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Err(AuthError::EmailTaken)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn find_by_email(&self, email: &str) -> AuthResult<Option<Identity>> {
        let row = sqlx::query(
            "SELECT id, email, password_hash, first_name, last_name, is_active, created_at, updated_at
             FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(identity_from_row).transpose()?)
    }

    async fn find_by_id(&self, user_id: UserId) -> AuthResult<Option<Identity>> {
        let row = sqlx::query(
            "SELECT id, email, password_hash, first_name, last_name, is_active, created_at, updated_at
             FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(identity_from_row).transpose()?)
    }

    async fn persist(&self, identity: &Identity) -> AuthResult<()> {
        let result = sqlx::query(
            "UPDATE users
             SET email = $2, password_hash = $3, first_name = $4, last_name = $5,
                 is_active = $6, updated_at = $7
             WHERE id = $1",
        )
        .bind(identity.id)
        .bind(&identity.email)
        .bind(identity.password.as_stored())
        .bind(&identity.first_name)
        .bind(&identity.last_name)
        .bind(identity.is_active)
        .bind(identity.updated_at.map(|dt| dt.naive_utc()))
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AuthError::UserNotFound);
        }
        Ok(())
    }
}
