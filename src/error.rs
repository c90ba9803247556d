/// Error Handling Module
///
/// One closed error type covers every failure the authentication core can
/// produce. Internal variants carry a diagnostic message that is written to
/// the log and never rendered into a response body.
///
/// 1. Error taxonomy (`AuthError`)
/// 2. HTTP response mapping (`ErrorHandler`, `ResponseError`)
/// 3. Structured error logging with request context

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use thiserror::Error;

/// ============================================================================
/// 1. ERROR TAXONOMY
/// ============================================================================

#[derive(Debug, Error)]
pub enum AuthError {
    /// Malformed request data, e.g. an email that is not email-shaped.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Password rejected by the strength policy.
    #[error("weak credential: {0}")]
    WeakCredential(String),

    #[error("credential mismatch")]
    CredentialMismatch,

    #[error("principal not found")]
    PrincipalNotFound,

    /// Authorization header missing or not of the form `Bearer <token>`.
    #[error("malformed credential: {0}")]
    MalformedCredential(String),

    /// Access token failed verification. Covers malformed structure, wrong
    /// algorithm, bad signature, expiry and an unparseable subject alike.
    #[error("invalid access token")]
    InvalidAccessToken,

    /// Refresh token never existed, expired, or was revoked.
    #[error("invalid refresh token")]
    InvalidRefreshToken,

    #[error("principal already exists")]
    DuplicatePrincipal,

    #[error("signing failure: {0}")]
    SigningFailure(String),

    #[error("hashing failure: {0}")]
    HashingFailure(String),

    #[error("entropy failure: {0}")]
    EntropyFailure(String),

    #[error("store failure: {0}")]
    StoreFailure(String),
}

impl AuthError {
    /// Stable outward error code. Principal-not-found and credential
    /// mismatch deliberately share one code.
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::InvalidInput(_) => "INVALID_INPUT",
            AuthError::WeakCredential(_) => "WEAK_CREDENTIAL",
            AuthError::CredentialMismatch | AuthError::PrincipalNotFound => {
                "AUTHENTICATION_FAILED"
            }
            AuthError::MalformedCredential(_) => "MALFORMED_CREDENTIAL",
            AuthError::InvalidAccessToken | AuthError::InvalidRefreshToken => "TOKEN_INVALID",
            AuthError::DuplicatePrincipal => "DUPLICATE_ENTRY",
            AuthError::SigningFailure(_)
            | AuthError::HashingFailure(_)
            | AuthError::EntropyFailure(_)
            | AuthError::StoreFailure(_) => "INTERNAL_ERROR",
        }
    }

    /// Message safe to show across the trust boundary.
    pub fn public_message(&self) -> String {
        match self {
            AuthError::InvalidInput(msg) => msg.clone(),
            AuthError::WeakCredential(msg) => msg.clone(),
            AuthError::CredentialMismatch | AuthError::PrincipalNotFound => {
                "Incorrect email or password".to_string()
            }
            AuthError::MalformedCredential(_) => {
                "Missing or malformed authorization header".to_string()
            }
            AuthError::InvalidAccessToken | AuthError::InvalidRefreshToken => {
                "Invalid or expired token".to_string()
            }
            AuthError::DuplicatePrincipal => "Email already registered".to_string(),
            AuthError::SigningFailure(_)
            | AuthError::HashingFailure(_)
            | AuthError::EntropyFailure(_)
            | AuthError::StoreFailure(_) => "Internal server error".to_string(),
        }
    }

    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            AuthError::SigningFailure(_)
                | AuthError::HashingFailure(_)
                | AuthError::EntropyFailure(_)
                | AuthError::StoreFailure(_)
        )
    }
}

impl From<sqlx::Error> for AuthError {
    fn from(err: sqlx::Error) -> Self {
        AuthError::StoreFailure(err.to_string())
    }
}

// ============================================================================
// 2. HTTP RESPONSE MAPPING
// ============================================================================

/// Error response structure for HTTP responses
#[derive(Debug, serde::Serialize)]
pub struct ErrorResponse {
    /// Unique error ID for correlating the response with the log line
    pub error_id: String,
    pub message: String,
    pub code: String,
    pub status: u16,
    pub timestamp: String,
}

impl ErrorResponse {
    pub fn new(error_id: String, message: String, code: String, status: u16) -> Self {
        Self {
            error_id,
            message,
            code,
            status,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Trait for converting errors to HTTP responses with proper logging
pub trait ErrorHandler {
    fn error_response(&self, request_id: &str) -> (StatusCode, ErrorResponse);
    fn log_error(&self, request_id: &str);
}

impl ErrorHandler for AuthError {
    fn error_response(&self, request_id: &str) -> (StatusCode, ErrorResponse) {
        let status = <Self as ResponseError>::status_code(self);
        let error_response = ErrorResponse::new(
            request_id.to_string(),
            self.public_message(),
            self.code().to_string(),
            status.as_u16(),
        );

        (status, error_response)
    }

    fn log_error(&self, request_id: &str) {
        match self {
            AuthError::CredentialMismatch | AuthError::PrincipalNotFound => {
                tracing::warn!(
                    request_id = request_id,
                    error = %self,
                    "Authentication failed"
                );
            }
            AuthError::InvalidAccessToken
            | AuthError::InvalidRefreshToken
            | AuthError::MalformedCredential(_) => {
                tracing::warn!(
                    request_id = request_id,
                    error = %self,
                    "Token rejected"
                );
            }
            e if e.is_internal() => {
                tracing::error!(
                    request_id = request_id,
                    error = %e,
                    "Internal error"
                );
            }
            e => {
                tracing::info!(
                    request_id = request_id,
                    error = %e,
                    "Request rejected"
                );
            }
        }
    }
}

impl ResponseError for AuthError {
    fn error_response(&self) -> HttpResponse {
        let request_id = uuid::Uuid::new_v4().to_string();
        self.log_error(&request_id);

        let (status, error_response) = <Self as ErrorHandler>::error_response(self, &request_id);

        HttpResponse::build(status).json(error_response)
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AuthError::InvalidInput(_)
            | AuthError::WeakCredential(_)
            | AuthError::MalformedCredential(_) => StatusCode::BAD_REQUEST,
            AuthError::CredentialMismatch
            | AuthError::PrincipalNotFound
            | AuthError::InvalidAccessToken
            | AuthError::InvalidRefreshToken => StatusCode::UNAUTHORIZED,
            AuthError::DuplicatePrincipal => StatusCode::CONFLICT,
            AuthError::SigningFailure(_)
            | AuthError::HashingFailure(_)
            | AuthError::EntropyFailure(_)
            | AuthError::StoreFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

// ============================================================================
// 3. ERROR CONTEXT ENRICHMENT
// ============================================================================

/// Error context for enhanced logging and debugging
#[derive(Debug, Clone)]
pub struct ErrorContext {
    pub request_id: String,
    pub user_id: Option<String>,
    pub operation: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl ErrorContext {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            request_id: uuid::Uuid::new_v4().to_string(),
            user_id: None,
            operation: operation.into(),
            timestamp: chrono::Utc::now(),
        }
    }

    pub fn with_user_id(mut self, user_id: String) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn log_error(&self, error: &AuthError) {
        let context = serde_json::json!({
            "request_id": self.request_id,
            "operation": self.operation,
            "user_id": self.user_id,
            "timestamp": self.timestamp.to_rfc3339(),
        });

        if error.is_internal() {
            tracing::error!(error = %error, context = ?context, "Internal error");
        } else {
            tracing::warn!(error = %error, context = ?context, "Authentication error");
        }
    }
}
