// handlers/auth/session.rs - /api/auth/me and /api/auth/logout

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde_json::{json, Value};

use crate::database::models::{ProfileUpdate, UserProfile};
use crate::database::DatabaseError;
use crate::error::{ApiError, ApiResult};
use crate::middleware::RequireUser;
use crate::state::AppState;

/// GET /api/auth/me - stored profile of the token's user
pub async fn me(State(state): State<AppState>, RequireUser(user): RequireUser) -> ApiResult<Json<UserProfile>> {
    let stored = state
        .users
        .find_by_id(&user.id)
        .await?
        .ok_or_else(|| ApiError::unauthorized("User not found"))?;
    Ok(Json(stored.profile()))
}

/// PUT /api/auth/me - change full_name, phone and/or avatar_url
pub async fn update_me(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    payload: Result<Json<ProfileUpdate>, JsonRejection>,
) -> ApiResult<Json<UserProfile>> {
    let Json(update) = payload?;
    let updated = state.users.update_profile(&user.id, update).await.map_err(|e| match e {
        DatabaseError::NotFound(_) => ApiError::unauthorized("User not found"),
        other => other.into(),
    })?;
    Ok(Json(updated.profile()))
}

/// POST /api/auth/logout
pub async fn logout() -> Json<Value> {
    Json(json!({ "success": true }))
}
