use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use std::convert::Infallible;

use crate::auth::{validate_jwt, Claims};
use crate::error::ApiError;
use crate::state::AppState;

/// Identity decoded from a verified bearer token
#[derive(Clone, Debug, PartialEq)]
pub struct AuthUser {
    pub id: String,
    pub email: String,
    pub full_name: Option<String>,
    pub role: String,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.id,
            email: claims.email,
            full_name: claims.full_name,
            role: claims.role,
        }
    }
}

/// Attaches an `AuthUser` when the request carries a valid bearer token.
///
/// Never rejects: a missing, malformed, forged or expired token just leaves
/// the request anonymous. Routes that need an identity use `RequireUser`.
pub async fn auth_gate(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    let identity = extract_jwt_from_headers(request.headers()).and_then(|token| {
        validate_jwt(&token, &state.config.security).map_err(|e| e.to_string())
    });

    match identity {
        Ok(claims) => {
            request.extensions_mut().insert(AuthUser::from(claims));
        }
        Err(reason) => tracing::debug!("Proceeding without identity: {}", reason),
    }

    next.run(request).await
}

/// Extract JWT token from Authorization header
fn extract_jwt_from_headers(headers: &HeaderMap) -> Result<String, String> {
    let auth_header = headers
        .get(AUTHORIZATION)
        .ok_or_else(|| "Missing Authorization header".to_string())?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| "Invalid Authorization header format".to_string())?;

    match auth_str.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(token.trim().to_string()),
        Some(_) => Err("Empty JWT token".to_string()),
        None => Err("Authorization header must use Bearer token format".to_string()),
    }
}

/// Identity if the auth gate attached one.
pub struct MaybeUser(pub Option<AuthUser>);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for MaybeUser {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeUser(parts.extensions.get::<AuthUser>().cloned()))
    }
}

/// Identity or 401.
pub struct RequireUser(pub AuthUser);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for RequireUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .map(RequireUser)
            .ok_or_else(|| ApiError::unauthorized("Authentication required"))
    }
}
