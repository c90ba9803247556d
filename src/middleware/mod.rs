/// Middleware module
///
/// Access-token guard for protected routes.

mod jwt_middleware;

pub use jwt_middleware::{AuthenticatedUser, JwtMiddleware};
