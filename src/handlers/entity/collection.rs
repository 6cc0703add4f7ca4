use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::Value;

use crate::database::EntityRecord;
use crate::error::ApiResult;
use crate::middleware::MaybeUser;
use crate::state::AppState;

/// GET /api/:entity?field=value&sort=-created_at&limit=N
pub async fn list(
    State(state): State<AppState>,
    Path(entity): Path<String>,
    Query(query): Query<Vec<(String, String)>>,
) -> ApiResult<Json<Vec<EntityRecord>>> {
    let records = state.entities.list(&entity, &query).await?;
    Ok(Json(records))
}

/// POST /api/:entity
pub async fn create(
    State(state): State<AppState>,
    Path(entity): Path<String>,
    MaybeUser(user): MaybeUser,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<EntityRecord>)> {
    let Json(body) = payload?;
    let created_by = user.as_ref().map(|u| u.id.as_str());
    let record = state.entities.create(&entity, body, created_by).await?;
    Ok((StatusCode::CREATED, Json(record)))
}
