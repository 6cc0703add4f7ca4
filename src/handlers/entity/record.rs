use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use serde_json::{json, Value};

use crate::database::EntityRecord;
use crate::error::ApiResult;
use crate::state::AppState;

/// GET /api/:entity/:id
pub async fn get(
    State(state): State<AppState>,
    Path((entity, id)): Path<(String, String)>,
) -> ApiResult<Json<EntityRecord>> {
    Ok(Json(state.entities.get(&entity, &id).await?))
}

/// PUT /api/:entity/:id - shallow merge into the stored document
pub async fn update(
    State(state): State<AppState>,
    Path((entity, id)): Path<(String, String)>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<EntityRecord>> {
    let Json(body) = payload?;
    Ok(Json(state.entities.update(&entity, &id, body).await?))
}

/// DELETE /api/:entity/:id
pub async fn delete(
    State(state): State<AppState>,
    Path((entity, id)): Path<(String, String)>,
) -> ApiResult<Json<Value>> {
    state.entities.delete(&entity, &id).await?;
    Ok(Json(json!({ "success": true })))
}
