/// JWT Token Generation and Validation
///
/// Access tokens are compact HS256-signed JWTs. They are never persisted;
/// validity is signature plus expiry, checked at verification time.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::auth::claims::Claims;
use crate::error::AuthError;

/// Issue an access token for `subject`, valid for `ttl` from now
///
/// # Errors
/// Returns `SigningFailure` if the claims cannot be serialized or signed
pub fn issue_access_token(
    subject: Uuid,
    signing_key: &[u8],
    ttl: Duration,
) -> Result<String, AuthError> {
    issue_access_token_at(subject, signing_key, ttl, Utc::now())
}

/// Issue an access token with an explicit issued-at instant
pub fn issue_access_token_at(
    subject: Uuid,
    signing_key: &[u8],
    ttl: Duration,
    now: DateTime<Utc>,
) -> Result<String, AuthError> {
    let claims = Claims::new(subject, ttl, now);

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(signing_key),
    )
    .map_err(|e| AuthError::SigningFailure(e.to_string()))
}

/// Verify an access token and return its subject
///
/// Only HMAC algorithms are accepted. Every failure cause (structure,
/// algorithm, signature, expiry, subject) collapses to `InvalidAccessToken`;
/// the cause is logged at debug level only.
pub fn verify_access_token(token: &str, signing_key: &[u8]) -> Result<Uuid, AuthError> {
    verify_access_token_at(token, signing_key, Utc::now())
}

/// Verify an access token as of `now`
///
/// A token is valid only while `now` is strictly before its expiry second.
pub fn verify_access_token_at(
    token: &str,
    signing_key: &[u8],
    now: DateTime<Utc>,
) -> Result<Uuid, AuthError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.algorithms = vec![Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];
    validation.leeway = 0;
    validation.set_required_spec_claims(&["exp", "sub"]);

    let claims = decode::<Claims>(token, &DecodingKey::from_secret(signing_key), &validation)
        .map(|data| data.claims)
        .map_err(|e| {
            tracing::debug!("JWT validation error: {}", e);
            AuthError::InvalidAccessToken
        })?;

    // jsonwebtoken still accepts the token during its expiry second
    if claims.exp <= now.timestamp() {
        tracing::debug!("JWT validation error: expired at {}", claims.exp);
        return Err(AuthError::InvalidAccessToken);
    }

    claims.subject()
}
