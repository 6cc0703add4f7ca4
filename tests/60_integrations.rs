mod common;

use anyhow::Result;
use axum::http::StatusCode;
use serde_json::json;

#[tokio::test]
async fn stub_integrations_acknowledge() -> Result<()> {
    let app = common::spawn_app().await?;

    let (status, body) = app.post("/api/ai/invoke", None, json!({ "prompt": "Summarise this lead" })).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let (status, body) = app
        .post("/api/email/send", None, json!({ "to": "student@example.com", "subject": "Offer" }))
        .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let (status, body) = app.post("/api/app-logs", None, json!({ "level": "info", "message": "page view" })).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "success": true }));
    Ok(())
}

#[tokio::test]
async fn stubs_do_not_create_entity_tables() -> Result<()> {
    let app = common::spawn_app().await?;
    app.post("/api/app-logs", None, json!({ "message": "x" })).await?;
    app.post("/api/ai/invoke", None, json!({})).await?;

    let (_, rows) = app.get("/api/applogs", None).await?;
    assert_eq!(rows, json!([]));
    let names: Vec<(String,)> = sqlx::query_as("SELECT name FROM _entity_registry")
        .fetch_all(&app.state.pool)
        .await?;
    assert_eq!(names, vec![("applogs".to_string(),)]);
    Ok(())
}
