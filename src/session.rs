/// Session Protocol
///
/// Orchestrates the user-facing flows: register, login, refresh, revoke and
/// access-token authentication. Holds no mutable state of its own; durable
/// state lives in the stores and signing is a pure function of the key.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::auth::{
    bearer_token, generate_refresh_token, hash_password, issue_access_token_at,
    verify_access_token, verify_against_dummy, verify_password,
};
use crate::configuration::AuthSettings;
use crate::error::{AuthError, ErrorContext};
use crate::store::{PrincipalStore, PrincipalView, RefreshTokenStore};
use crate::validators::is_valid_email;

pub const DEFAULT_ACCESS_TOKEN_TTL_SECONDS: i64 = 3600;
pub const DEFAULT_REFRESH_TOKEN_TTL_HOURS: i64 = 1440;

/// Signing key and token lifetimes, fixed for the life of the process
#[derive(Clone)]
pub struct SessionConfig {
    pub signing_key: Vec<u8>,
    pub access_token_ttl: Duration,
    pub refresh_token_ttl: Duration,
}

impl SessionConfig {
    /// Default lifetimes: one hour for access tokens, 1440 hours for
    /// refresh tokens.
    pub fn new(signing_key: impl Into<Vec<u8>>) -> Self {
        Self {
            signing_key: signing_key.into(),
            access_token_ttl: Duration::seconds(DEFAULT_ACCESS_TOKEN_TTL_SECONDS),
            refresh_token_ttl: Duration::hours(DEFAULT_REFRESH_TOKEN_TTL_HOURS),
        }
    }
}

impl From<&AuthSettings> for SessionConfig {
    fn from(settings: &AuthSettings) -> Self {
        Self {
            signing_key: settings.signing_secret.as_bytes().to_vec(),
            access_token_ttl: Duration::seconds(settings.access_token_ttl_seconds),
            refresh_token_ttl: Duration::hours(settings.refresh_token_ttl_hours),
        }
    }
}

/// Email and plaintext password as presented by the client
#[derive(serde::Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Tokens handed back by a successful login
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub user_id: Uuid,
    pub email: String,
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Clone)]
pub struct SessionProtocol {
    config: SessionConfig,
    principals: Arc<dyn PrincipalStore>,
    refresh_tokens: Arc<dyn RefreshTokenStore>,
}

impl SessionProtocol {
    pub fn new(
        config: SessionConfig,
        principals: Arc<dyn PrincipalStore>,
        refresh_tokens: Arc<dyn RefreshTokenStore>,
    ) -> Self {
        Self {
            config,
            principals,
            refresh_tokens,
        }
    }

    pub fn access_token_ttl(&self) -> Duration {
        self.config.access_token_ttl
    }

    /// Create a principal with a hashed password
    ///
    /// # Errors
    /// `InvalidInput`, `WeakCredential`, `DuplicatePrincipal`,
    /// `HashingFailure`, `StoreFailure`
    pub async fn register(&self, credentials: Credentials) -> Result<PrincipalView, AuthError> {
        let context = ErrorContext::new("user_registration");

        let email = is_valid_email(&credentials.email)
            .map_err(|e| AuthError::InvalidInput(e.to_string()))?;
        let password = credentials.password;
        let hashed_password = run_blocking(move || hash_password(&password)).await?;

        let principal = self.principals.insert(&email, &hashed_password).await?;

        tracing::info!(
            request_id = %context.request_id,
            user_id = %principal.id,
            "User registered"
        );

        Ok(principal.into())
    }

    /// Verify credentials and issue an access token plus a persisted
    /// refresh token
    ///
    /// Unknown email and wrong password both surface as authentication
    /// failures with identical outward code and comparable bcrypt cost.
    pub async fn login(
        &self,
        credentials: Credentials,
        now: DateTime<Utc>,
    ) -> Result<LoginOutcome, AuthError> {
        let context = ErrorContext::new("user_login");

        let email = is_valid_email(&credentials.email)
            .map_err(|e| AuthError::InvalidInput(e.to_string()))?;

        let principal = self.principals.find_by_email(&email).await?;
        let password = credentials.password;

        let principal = match principal {
            Some(principal) => {
                let hash = principal.hashed_password.clone();
                run_blocking(move || verify_password(&password, &hash)).await?;
                principal
            }
            None => {
                run_blocking(move || {
                    verify_against_dummy(&password);
                    Ok(())
                })
                .await?;
                return Err(AuthError::PrincipalNotFound);
            }
        };

        let access_token = issue_access_token_at(
            principal.id,
            &self.config.signing_key,
            self.config.access_token_ttl,
            now,
        )?;

        let refresh_token = generate_refresh_token()?;
        let expires_at = now + self.config.refresh_token_ttl;

        // The access token above is simply dropped if this fails; it was
        // never recorded anywhere.
        if let Err(e) = self
            .refresh_tokens
            .insert(&refresh_token, principal.id, expires_at)
            .await
        {
            context
                .clone()
                .with_user_id(principal.id.to_string())
                .log_error(&e);
            return Err(e);
        }

        tracing::info!(
            request_id = %context.request_id,
            user_id = %principal.id,
            "User logged in"
        );

        Ok(LoginOutcome {
            user_id: principal.id,
            email: principal.email,
            access_token,
            refresh_token,
        })
    }

    /// Exchange a usable refresh token for a new access token
    ///
    /// The refresh token is not rotated: it stays usable until it expires or
    /// is revoked.
    pub async fn refresh(
        &self,
        authorization: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<String, AuthError> {
        let context = ErrorContext::new("token_refresh");
        let token = bearer_token(authorization)?;

        let record = self
            .refresh_tokens
            .find_usable(token, now)
            .await?
            .ok_or(AuthError::InvalidRefreshToken)?;

        let access_token = issue_access_token_at(
            record.user_id,
            &self.config.signing_key,
            self.config.access_token_ttl,
            now,
        )?;

        tracing::info!(
            request_id = %context.request_id,
            user_id = %record.user_id,
            "Access token refreshed"
        );

        Ok(access_token)
    }

    /// Revoke a refresh token
    ///
    /// Any holder of the token string may revoke it. Revoking an unknown or
    /// already revoked token succeeds.
    pub async fn revoke(
        &self,
        authorization: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<(), AuthError> {
        let context = ErrorContext::new("token_revoke");
        let token = bearer_token(authorization)?;

        self.refresh_tokens.revoke(token, now).await?;

        tracing::info!(request_id = %context.request_id, "Refresh token revoked");
        Ok(())
    }

    /// Resolve a bearer access token to the identity it was issued for
    pub fn authenticate(&self, authorization: Option<&str>) -> Result<Uuid, AuthError> {
        let token = bearer_token(authorization)?;
        verify_access_token(token, &self.config.signing_key)
    }
}

/// Run CPU-heavy bcrypt work off the async workers
async fn run_blocking<T, F>(work: F) -> Result<T, AuthError>
where
    F: FnOnce() -> Result<T, AuthError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| AuthError::HashingFailure(format!("blocking task failed: {}", e)))?
}
