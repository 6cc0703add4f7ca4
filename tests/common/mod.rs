#![allow(dead_code)]

use anyhow::{Context, Result};
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use edu_crm_api::database::DatabaseManager;
use edu_crm_api::{router, AppConfig, AppState};

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
}

/// App over a private in-memory database.
pub async fn spawn_app() -> Result<TestApp> {
    let pool = DatabaseManager::open_in_memory().await.context("open in-memory database")?;
    let state = AppState::new(pool, AppConfig::testing());
    Ok(TestApp { router: router(state.clone()), state })
}

/// App over a WAL database file with a multi-connection pool.
pub async fn spawn_file_app(dir: &tempfile::TempDir) -> Result<TestApp> {
    let mut config = AppConfig::testing();
    config.database.path = dir.path().join("crm.db").to_string_lossy().into_owned();
    config.database.max_connections = 8;
    let pool = DatabaseManager::open(&config.database).await.context("open file database")?;
    let state = AppState::new(pool, config);
    Ok(TestApp { router: router(state.clone()), state })
}

impl TestApp {
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Result<(StatusCode, Value)> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&body)?))?,
            None => builder.body(Body::empty())?,
        };

        let response = self.router.clone().oneshot(request).await?;
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        Ok((status, value))
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> Result<(StatusCode, Value)> {
        self.request(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> Result<(StatusCode, Value)> {
        self.request(Method::POST, uri, token, Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: Option<&str>, body: Value) -> Result<(StatusCode, Value)> {
        self.request(Method::PUT, uri, token, Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> Result<(StatusCode, Value)> {
        self.request(Method::DELETE, uri, token, None).await
    }

    /// Register a user and return (id, token).
    pub async fn register(&self, email: &str, password: &str) -> Result<(String, String)> {
        let (status, body) = self
            .post(
                "/api/auth/register",
                None,
                json!({ "email": email, "password": password, "full_name": "Test User" }),
            )
            .await?;
        anyhow::ensure!(status == StatusCode::CREATED, "register failed: {} {}", status, body);
        let id = body["id"].as_str().context("missing id")?.to_string();
        let token = body["token"].as_str().context("missing token")?.to_string();
        Ok((id, token))
    }
}
