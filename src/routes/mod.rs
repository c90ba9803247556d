mod auth;
mod health_check;

pub use auth::{login, refresh, register, revoke, whoami};
pub use health_check::health_check;
