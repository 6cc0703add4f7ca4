// handlers/auth/login.rs - POST /api/auth/login

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::Deserialize;
use serde_json::Value;

use super::{issue_token, non_empty, run_blocking};
use crate::auth::verify_password;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

fn invalid_credentials() -> ApiError {
    ApiError::unauthorized("Invalid email or password")
}

/// Verify credentials and return the profile plus a signed token.
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Json(req) = payload?;
    let (email, password) = match (non_empty(req.email), req.password) {
        (Some(email), Some(password)) => (email, password),
        _ => return Err(ApiError::bad_request("Email and password are required")),
    };

    let user = state.users.find_by_email(&email).await?.ok_or_else(invalid_credentials)?;

    let hash = user.password_hash.clone();
    let matches = run_blocking(move || verify_password(&password, &hash)).await?;
    if !matches || !user.is_active {
        tracing::debug!("Rejected login for {}", user.email);
        return Err(invalid_credentials());
    }

    let token = issue_token(&user, &state.config.security)?;
    let mut body = serde_json::to_value(user.profile())
        .map_err(|e| ApiError::internal_server_error(e.to_string()))?;
    body["token"] = Value::String(token);

    Ok(Json(body))
}
