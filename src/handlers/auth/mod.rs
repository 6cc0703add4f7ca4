// handlers/auth/mod.rs - account and session handlers
//
// Tokens are stateless: there is no server-side session, refresh or
// revocation. Logout only exists so clients have something to call.

pub mod login;
pub mod register;
pub mod session;

pub use login::login;
pub use register::register;
pub use session::{logout, me, update_me};

use crate::auth::{generate_jwt, AuthError, Claims};
use crate::config::SecurityConfig;
use crate::database::models::User;
use crate::error::{ApiError, ApiResult};

pub(crate) fn issue_token(user: &User, security: &SecurityConfig) -> Result<String, AuthError> {
    let claims = Claims::new(
        user.id.clone(),
        user.email.clone(),
        user.full_name.clone(),
        user.role.clone(),
        security.jwt_expiry_hours,
    );
    generate_jwt(&claims, security)
}

/// bcrypt is CPU-bound; keep it off the async workers.
pub(crate) async fn run_blocking<T, F>(f: F) -> ApiResult<T>
where
    F: FnOnce() -> Result<T, AuthError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError::internal_server_error(e.to_string()))?
        .map_err(ApiError::from)
}

pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
