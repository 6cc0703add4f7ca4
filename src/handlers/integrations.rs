// handlers/integrations.rs - stub third-party integrations
//
// The LLM, email and client-log endpoints only acknowledge the call and log
// it. Nothing is persisted.

use axum::{extract::rejection::JsonRejection, Json};
use serde_json::{json, Value};

use crate::error::ApiResult;
use crate::middleware::MaybeUser;

fn caller(user: &MaybeUser) -> &str {
    user.0.as_ref().map(|u| u.id.as_str()).unwrap_or("anonymous")
}

/// POST /api/ai/invoke
pub async fn ai_invoke(user: MaybeUser, payload: Result<Json<Value>, JsonRejection>) -> ApiResult<Json<Value>> {
    let Json(body) = payload?;
    let prompt_len = body.get("prompt").and_then(Value::as_str).map(str::len).unwrap_or(0);
    tracing::info!("AI invoke requested by {} (prompt: {} chars)", caller(&user), prompt_len);

    Ok(Json(json!({
        "success": true,
        "response": "AI integration is not configured on this server",
    })))
}

/// POST /api/email/send
pub async fn email_send(user: MaybeUser, payload: Result<Json<Value>, JsonRejection>) -> ApiResult<Json<Value>> {
    let Json(body) = payload?;
    let to = body.get("to").and_then(Value::as_str).unwrap_or("<none>");
    tracing::info!("Email send requested by {} to {}", caller(&user), to);

    Ok(Json(json!({
        "success": true,
        "message": "Email queued",
    })))
}

/// POST /api/app-logs
pub async fn app_logs(user: MaybeUser, payload: Result<Json<Value>, JsonRejection>) -> ApiResult<Json<Value>> {
    let Json(body) = payload?;
    tracing::info!(target: "app_logs", user = caller(&user), entry = %body, "client log");

    Ok(Json(json!({ "success": true })))
}
