mod common;

use anyhow::Result;
use futures::future::join_all;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_first_access_creates_one_table() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let app = common::spawn_file_app(&dir).await?;
    let entities = app.state.entities.clone();

    // Separate store instances each have a cold memo, so all of them hit the
    // registry/DDL path at once.
    let stores: Vec<_> = (0..8)
        .map(|_| edu_crm_api::database::SqliteEntityStore::new(app.state.pool.clone(), &app.state.config))
        .collect();
    let results = join_all(stores.iter().map(|s| s.registry().ensure_table("Brand New-Entity"))).await;

    for result in &results {
        assert_eq!(result.as_ref().map(String::as_str).ok(), Some("BrandNewEntity"));
    }

    let (tables,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'entity_BrandNewEntity'",
    )
    .fetch_one(&app.state.pool)
    .await?;
    assert_eq!(tables, 1);

    let (registered,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM _entity_registry WHERE name = 'BrandNewEntity'")
            .fetch_one(&app.state.pool)
            .await?;
    assert_eq!(registered, 1);

    // The shared store sees the same table
    assert!(entities.list("BrandNewEntity", &[]).await?.is_empty());
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_creates_through_http() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let app = common::spawn_file_app(&dir).await?;

    let requests = (0..10).map(|n| app.post("/api/Enquiry", None, serde_json::json!({ "n": n })));
    for result in join_all(requests).await {
        let (status, _) = result?;
        assert_eq!(status, axum::http::StatusCode::CREATED);
    }

    let (_, rows) = app.get("/api/Enquiry", None).await?;
    assert_eq!(rows.as_array().map(Vec::len), Some(10));
    Ok(())
}
