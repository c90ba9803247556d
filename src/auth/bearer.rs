/// Bearer credential extraction
///
/// Pulls the token out of an `Authorization: Bearer <token>` header value.
/// The same shape carries access and refresh tokens; which one it is depends
/// only on the operation it is handed to.

use actix_web::http::header::{HeaderMap, AUTHORIZATION};

use crate::error::AuthError;

const BEARER_PREFIX: &str = "Bearer ";

/// Extract the token from an Authorization header value
///
/// # Errors
/// Returns `MalformedCredential` when the header is absent, lacks the
/// `Bearer ` prefix, or carries an empty token.
pub fn bearer_token(authorization: Option<&str>) -> Result<&str, AuthError> {
    let header = authorization.ok_or_else(|| {
        AuthError::MalformedCredential("authorization header is missing".to_string())
    })?;

    let token = header.strip_prefix(BEARER_PREFIX).ok_or_else(|| {
        AuthError::MalformedCredential("authorization header is not a bearer credential".to_string())
    })?;

    let token = token.trim();
    if token.is_empty() {
        return Err(AuthError::MalformedCredential(
            "bearer token is empty".to_string(),
        ));
    }

    Ok(token)
}

/// Read the Authorization header as a string, if present and valid UTF-8
pub fn authorization_header(headers: &HeaderMap) -> Option<&str> {
    headers.get(AUTHORIZATION).and_then(|h| h.to_str().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_token() {
        assert_eq!(bearer_token(Some("Bearer abc.def.ghi")).unwrap(), "abc.def.ghi");
    }

    #[test]
    fn test_missing_header() {
        assert!(matches!(bearer_token(None), Err(AuthError::MalformedCredential(_))));
    }

    #[test]
    fn test_wrong_scheme() {
        for header in ["Basic dXNlcjpwYXNz", "bearer abc", "Bearerabc", "abc"] {
            assert!(
                matches!(bearer_token(Some(header)), Err(AuthError::MalformedCredential(_))),
                "accepted {:?}",
                header
            );
        }
    }

    #[test]
    fn test_empty_token() {
        assert!(matches!(
            bearer_token(Some("Bearer ")),
            Err(AuthError::MalformedCredential(_))
        ));
        assert!(matches!(
            bearer_token(Some("Bearer    ")),
            Err(AuthError::MalformedCredential(_))
        ));
    }
}
