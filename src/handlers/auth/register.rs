// handlers/auth/register.rs - POST /api/auth/register

use axum::{extract::rejection::JsonRejection, extract::State, http::StatusCode, Json};
use serde::Deserialize;
use serde_json::{json, Value};

use super::{issue_token, non_empty, run_blocking};
use crate::auth::hash_password;
use crate::database::models::NewUser;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

const DEFAULT_ROLE: &str = "student";

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    pub full_name: Option<String>,
    pub role: Option<String>,
    pub phone: Option<String>,
}

/// Create an account and return it with a fresh token.
///
/// 400 when email or password is missing, 409 when the email is taken.
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let Json(req) = payload?;
    let (email, password) = match (non_empty(req.email), non_empty(req.password)) {
        (Some(email), Some(password)) => (email, password),
        _ => return Err(ApiError::bad_request("Email and password are required")),
    };

    if state.users.find_by_email(&email).await?.is_some() {
        return Err(ApiError::conflict("Email already registered"));
    }

    let cost = state.config.security.bcrypt_cost;
    let password_hash = run_blocking(move || hash_password(&password, cost)).await?;

    // A concurrent registration can still win the race; the UNIQUE index
    // turns that into the same 409.
    let user = state
        .users
        .create(NewUser {
            email,
            password_hash,
            full_name: req.full_name,
            role: non_empty(req.role).unwrap_or_else(|| DEFAULT_ROLE.to_string()),
            phone: req.phone,
        })
        .await?;

    let token = issue_token(&user, &state.config.security)?;
    tracing::info!("Registered user {} ({})", user.id, user.role);

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "id": user.id,
            "email": user.email,
            "full_name": user.full_name,
            "role": user.role,
            "token": token,
        })),
    ))
}
