/// JWT Claims structure
///
/// The registered claims (RFC 7519) carried by an access token: issuer,
/// issued-at, expiry and the subject identity.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AuthError;

/// Issuer name stamped into every access token
pub const ISSUER: &str = "session-gate";

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Issuer
    pub iss: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Subject (principal UUID as string)
    pub sub: String,
}

impl Claims {
    /// Build claims for `subject`, valid from `now` for `ttl`.
    pub fn new(subject: Uuid, ttl: Duration, now: DateTime<Utc>) -> Self {
        Self {
            iss: ISSUER.to_string(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
            sub: subject.to_string(),
        }
    }

    /// Parse the subject back into an identity
    pub fn subject(&self) -> Result<Uuid, AuthError> {
        Uuid::parse_str(&self.sub).map_err(|_| AuthError::InvalidAccessToken)
    }
}
