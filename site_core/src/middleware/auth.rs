//! Static-token gate for the job API. Disabled when no token is configured;
//! the mailer endpoints are never gated.

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::error::AppError;
use crate::AppState;

pub async fn token_auth_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let expected = match state.auth_token.as_deref() {
        Some(token) if !token.is_empty() => token,
        _ => return Ok(next.run(request).await),
    };

    let provided = extract_token(request.headers());
    match provided {
        Some(token) if token == expected => Ok(next.run(request).await),
        _ => Err(AppError::Unauthorized),
    }
}

/// Accepts `X-Token: <token>` or `Authorization: Bearer <token>`.
fn extract_token(headers: &HeaderMap) -> Option<String> {
    if let Some(value) = headers.get("x-token").and_then(|v| v.to_str().ok()) {
        return Some(value.trim().to_string());
    }

    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = if value.to_lowercase().starts_with("bearer ") {
        &value[7..]
    } else {
        value
    };
    Some(token.trim().to_string())
}
