/// Authentication Routes
///
/// Thin HTTP adapters over `SessionProtocol`: JSON in, JSON out, errors
/// rendered by `AuthError`'s `ResponseError` impl.

use actix_web::{web, HttpRequest, HttpResponse};
use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use crate::auth::authorization_header;
use crate::error::AuthError;
use crate::middleware::AuthenticatedUser;
use crate::session::{Credentials, SessionProtocol};

/// Login response with access and refresh tokens
#[derive(Serialize)]
pub struct LoginResponse {
    pub id: Uuid,
    pub email: String,
    pub token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

/// Refresh response carrying only the new access token
#[derive(Serialize)]
pub struct RefreshResponse {
    pub token: String,
    pub token_type: String,
    pub expires_in: i64,
}

#[derive(Serialize)]
pub struct WhoAmIResponse {
    pub user_id: Uuid,
}

/// POST /api/users
///
/// # Errors
/// - 400: Invalid email or weak password
/// - 409: Email already registered
/// - 500: Internal server error
pub async fn register(
    form: web::Json<Credentials>,
    session: web::Data<SessionProtocol>,
) -> Result<HttpResponse, AuthError> {
    let principal = session.register(form.into_inner()).await?;
    Ok(HttpResponse::Created().json(principal))
}

/// POST /api/login
///
/// # Errors
/// - 400: Invalid email format
/// - 401: Unknown email or wrong password (same response for both)
/// - 500: Internal server error
pub async fn login(
    form: web::Json<Credentials>,
    session: web::Data<SessionProtocol>,
) -> Result<HttpResponse, AuthError> {
    let outcome = session.login(form.into_inner(), Utc::now()).await?;

    Ok(HttpResponse::Ok().json(LoginResponse {
        id: outcome.user_id,
        email: outcome.email,
        token: outcome.access_token,
        refresh_token: outcome.refresh_token,
        token_type: "Bearer".to_string(),
        expires_in: session.access_token_ttl().num_seconds(),
    }))
}

/// POST /api/refresh
///
/// Expects `Authorization: Bearer <refresh_token>`.
///
/// # Errors
/// - 400: Missing or malformed Authorization header
/// - 401: Refresh token unknown, expired or revoked
pub async fn refresh(
    req: HttpRequest,
    session: web::Data<SessionProtocol>,
) -> Result<HttpResponse, AuthError> {
    let token = session
        .refresh(authorization_header(req.headers()), Utc::now())
        .await?;

    Ok(HttpResponse::Ok().json(RefreshResponse {
        token,
        token_type: "Bearer".to_string(),
        expires_in: session.access_token_ttl().num_seconds(),
    }))
}

/// POST /api/revoke
///
/// Expects `Authorization: Bearer <refresh_token>`. Returns 204 whether or
/// not the token existed.
pub async fn revoke(
    req: HttpRequest,
    session: web::Data<SessionProtocol>,
) -> Result<HttpResponse, AuthError> {
    session
        .revoke(authorization_header(req.headers()), Utc::now())
        .await?;

    Ok(HttpResponse::NoContent().finish())
}

/// GET /api/whoami
///
/// **Requires valid access token**; identity is injected by `JwtMiddleware`.
pub async fn whoami(user: web::ReqData<AuthenticatedUser>) -> HttpResponse {
    HttpResponse::Ok().json(WhoAmIResponse { user_id: user.0 })
}
