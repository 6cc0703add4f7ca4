use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use std::any::Any;
use tower_http::{catch_panic::CatchPanicLayer, cors::CorsLayer, trace::TraceLayer};

use crate::config::SecurityConfig;
use crate::error::ApiError;
use crate::handlers;
use crate::middleware::auth_gate;
use crate::state::AppState;

/// Full HTTP surface with the auth gate, CORS, body limit, panic guard and
/// request tracing applied.
pub fn router(state: AppState) -> Router {
    let config = state.config.clone();

    Router::new()
        .route("/api/health", get(handlers::health::health))
        .merge(auth_routes())
        .merge(integration_routes())
        .merge(entity_routes())
        .fallback(not_found)
        .layer(middleware::from_fn_with_state(state.clone(), auth_gate))
        .layer(DefaultBodyLimit::max(config.api.max_request_size_bytes))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(cors_layer(&config.security))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn auth_routes() -> Router<AppState> {
    use handlers::auth;

    Router::new()
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/me", get(auth::me).put(auth::update_me))
        .route("/api/auth/logout", post(auth::logout))
}

fn integration_routes() -> Router<AppState> {
    use handlers::integrations;

    Router::new()
        .route("/api/ai/invoke", post(integrations::ai_invoke))
        .route("/api/email/send", post(integrations::email_send))
        .route("/api/app-logs", post(integrations::app_logs))
}

fn entity_routes() -> Router<AppState> {
    use handlers::entity;

    // Static routes above take precedence over these captures.
    Router::new()
        .route("/api/:entity", get(entity::list).post(entity::create))
        .route(
            "/api/:entity/:id",
            get(entity::get).put(entity::update).delete(entity::delete),
        )
}

fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter(|origin| origin.as_str() != "*")
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
}

async fn not_found() -> ApiError {
    ApiError::not_found("Not found")
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let message = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "Internal server error".to_string()
    };
    tracing::error!("Handler panicked: {}", message);
    ApiError::internal_server_error(message).into_response()
}
