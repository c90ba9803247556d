/// Postgres-backed store
///
/// Timestamps for `created_at`/`updated_at` are taken server-side. The
/// caller's `now` is used for expiry filtering and revocation time.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{Principal, PrincipalStore, RefreshTokenRecord, RefreshTokenStore};
use crate::error::AuthError;

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().as_deref() == Some("23505"),
        _ => false,
    }
}

#[async_trait]
impl PrincipalStore for PgStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<Principal>, AuthError> {
        let principal = sqlx::query_as::<_, Principal>(
            r#"
            SELECT id, created_at, updated_at, email, hashed_password
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(principal)
    }

    async fn insert(&self, email: &str, hashed_password: &str) -> Result<Principal, AuthError> {
        sqlx::query_as::<_, Principal>(
            r#"
            INSERT INTO users (id, created_at, updated_at, email, hashed_password)
            VALUES ($1, now(), now(), $2, $3)
            RETURNING id, created_at, updated_at, email, hashed_password
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(email)
        .bind(hashed_password)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AuthError::DuplicatePrincipal
            } else {
                AuthError::from(e)
            }
        })
    }
}

#[async_trait]
impl RefreshTokenStore for PgStore {
    async fn insert(
        &self,
        token: &str,
        owner: Uuid,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AuthError> {
        sqlx::query(
            r#"
            INSERT INTO refresh_tokens (token, created_at, updated_at, user_id, expires_at)
            VALUES ($1, now(), now(), $2, $3)
            "#,
        )
        .bind(token)
        .bind(owner)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_usable(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<RefreshTokenRecord>, AuthError> {
        let record = sqlx::query_as::<_, RefreshTokenRecord>(
            r#"
            SELECT token, created_at, updated_at, user_id, expires_at, revoked_at
            FROM refresh_tokens
            WHERE token = $1 AND revoked_at IS NULL AND expires_at > $2
            "#,
        )
        .bind(token)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    async fn revoke(&self, token: &str, now: DateTime<Utc>) -> Result<(), AuthError> {
        sqlx::query(
            r#"
            UPDATE refresh_tokens
            SET revoked_at = COALESCE(revoked_at, $2), updated_at = now()
            WHERE token = $1
            "#,
        )
        .bind(token)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
