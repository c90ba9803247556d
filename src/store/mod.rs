/// Persistence contracts for the session protocol
///
/// The protocol talks to storage only through these two traits. `PgStore`
/// backs them with Postgres; `InMemoryStore` backs them with process memory
/// for tests and local runs.

mod memory;
mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::error::AuthError;

pub use memory::InMemoryStore;
pub use postgres::PgStore;

/// A registered principal, including its stored password hash
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Principal {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub email: String,
    pub hashed_password: String,
}

/// Principal as exposed to callers; never carries the hash
#[derive(Debug, Clone, Serialize)]
pub struct PrincipalView {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub email: String,
}

impl From<Principal> for PrincipalView {
    fn from(principal: Principal) -> Self {
        Self {
            id: principal.id,
            created_at: principal.created_at,
            updated_at: principal.updated_at,
            email: principal.email,
        }
    }
}

/// A persisted refresh token row
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RefreshTokenRecord {
    pub token: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
}

impl RefreshTokenRecord {
    /// Usable iff not revoked and `now` is strictly before expiry.
    pub fn is_usable(&self, now: DateTime<Utc>) -> bool {
        self.revoked_at.is_none() && now < self.expires_at
    }
}

#[async_trait]
pub trait PrincipalStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<Principal>, AuthError>;

    /// Fails with `DuplicatePrincipal` if the email is taken.
    async fn insert(&self, email: &str, hashed_password: &str) -> Result<Principal, AuthError>;
}

#[async_trait]
pub trait RefreshTokenStore: Send + Sync {
    /// Atomically persist a new, unrevoked token.
    ///
    /// `PgStore` rejects an `owner` with no principal row through the
    /// foreign key. `InMemoryStore` does not check the owner.
    async fn insert(
        &self,
        token: &str,
        owner: Uuid,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AuthError>;

    /// The row for `token` if it is usable at `now`, otherwise `None`.
    async fn find_usable(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<RefreshTokenRecord>, AuthError>;

    /// Mark `token` revoked at `now`. Unconditional and idempotent: an
    /// unknown token is not an error, and an earlier revocation time is kept.
    async fn revoke(&self, token: &str, now: DateTime<Utc>) -> Result<(), AuthError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn record(expires_at: DateTime<Utc>, revoked_at: Option<DateTime<Utc>>) -> RefreshTokenRecord {
        let now = Utc::now();
        RefreshTokenRecord {
            token: "t".repeat(64),
            created_at: now,
            updated_at: now,
            user_id: Uuid::new_v4(),
            expires_at,
            revoked_at,
        }
    }

    #[test]
    fn test_usability_invariant() {
        let now = Utc::now();

        assert!(record(now + Duration::hours(1), None).is_usable(now));
        assert!(!record(now - Duration::seconds(1), None).is_usable(now));
        assert!(!record(now, None).is_usable(now));
        assert!(!record(now + Duration::hours(1), Some(now)).is_usable(now));
    }

    #[test]
    fn test_principal_view_drops_hash() {
        let now = Utc::now();
        let principal = Principal {
            id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            email: "a@b.com".to_string(),
            hashed_password: "$2b$12$secret".to_string(),
        };

        let json = serde_json::to_string(&PrincipalView::from(principal)).unwrap();
        assert!(json.contains("a@b.com"));
        assert!(!json.contains("hashed_password"));
        assert!(!json.contains("$2b$"));
    }
}
