/// Authentication primitives
///
/// Password hashing, access token signing/verification, refresh token
/// generation and bearer header parsing. Only the session protocol calls
/// into this module.

mod bearer;
mod claims;
mod jwt;
mod password;
mod refresh_token;

pub use bearer::{authorization_header, bearer_token};
pub use jwt::{issue_access_token, issue_access_token_at, verify_access_token};
pub use password::{hash_password, verify_against_dummy, verify_password};
pub use refresh_token::generate_refresh_token;
