/// In-memory store
///
/// Same contract as `PgStore`, except that refresh token owners are not
/// checked against the principal map. Each operation takes the lock once,
/// so inserts and revocations are atomic with respect to lookups.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{Principal, PrincipalStore, RefreshTokenRecord, RefreshTokenStore};
use crate::error::AuthError;

#[derive(Clone, Default)]
pub struct InMemoryStore {
    principals: Arc<RwLock<HashMap<String, Principal>>>,
    refresh_tokens: Arc<RwLock<HashMap<String, RefreshTokenRecord>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw row lookup, ignoring usability. Lets callers inspect revoked or
    /// expired rows.
    pub async fn refresh_token(&self, token: &str) -> Option<RefreshTokenRecord> {
        self.refresh_tokens.read().await.get(token).cloned()
    }

    /// All rows owned by `user_id`
    pub async fn refresh_tokens_for(&self, user_id: Uuid) -> Vec<RefreshTokenRecord> {
        self.refresh_tokens
            .read()
            .await
            .values()
            .filter(|record| record.user_id == user_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl PrincipalStore for InMemoryStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<Principal>, AuthError> {
        Ok(self.principals.read().await.get(email).cloned())
    }

    async fn insert(&self, email: &str, hashed_password: &str) -> Result<Principal, AuthError> {
        let mut principals = self.principals.write().await;
        if principals.contains_key(email) {
            return Err(AuthError::DuplicatePrincipal);
        }

        let now = Utc::now();
        let principal = Principal {
            id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            email: email.to_string(),
            hashed_password: hashed_password.to_string(),
        };
        principals.insert(email.to_string(), principal.clone());

        Ok(principal)
    }
}

#[async_trait]
impl RefreshTokenStore for InMemoryStore {
    async fn insert(
        &self,
        token: &str,
        owner: Uuid,
        expires_at: DateTime<Utc>,
    ) -> Result<(), AuthError> {
        let mut tokens = self.refresh_tokens.write().await;
        if tokens.contains_key(token) {
            return Err(AuthError::StoreFailure(
                "duplicate key value violates refresh_tokens primary key".to_string(),
            ));
        }

        let now = Utc::now();
        tokens.insert(
            token.to_string(),
            RefreshTokenRecord {
                token: token.to_string(),
                created_at: now,
                updated_at: now,
                user_id: owner,
                expires_at,
                revoked_at: None,
            },
        );

        Ok(())
    }

    async fn find_usable(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<RefreshTokenRecord>, AuthError> {
        Ok(self
            .refresh_tokens
            .read()
            .await
            .get(token)
            .filter(|record| record.is_usable(now))
            .cloned())
    }

    async fn revoke(&self, token: &str, now: DateTime<Utc>) -> Result<(), AuthError> {
        if let Some(record) = self.refresh_tokens.write().await.get_mut(token) {
            record.revoked_at.get_or_insert(now);
            record.updated_at = Utc::now();
        }

        Ok(())
    }
}
