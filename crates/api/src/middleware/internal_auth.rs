//! Shared-secret guard for service-to-service routes.

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use shared::crypto::secrets_match;

use crate::app::AppState;
use crate::error::ApiError;

/// Rejects requests whose `Authorization` header is not the internal secret.
pub async fn require_internal_secret(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let provided = req
        .headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok());

    match provided {
        Some(secret) if secrets_match(secret, &state.config.security.internal_secret) => {
            next.run(req).await
        }
        Some(_) => {
            tracing::warn!(path = %req.uri().path(), "Internal call with wrong secret");
            ApiError::Unauthorized("Invalid service credentials".to_string()).into_response()
        }
        None => ApiError::Unauthorized("Missing Authorization header".to_string()).into_response(),
    }
}
