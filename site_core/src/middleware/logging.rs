//! Request logging middleware

use axum::{body::Body, extract::Request, middleware::Next, response::Response};
use std::time::Instant;

pub async fn log_requests(
    request: Request<Body>,
    next: Next,
) -> Result<Response, std::convert::Infallible> {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    let response = next.run(request).await;

    let status = response.status();
    let latency_ms = start.elapsed().as_millis();

    if status.is_success() {
        tracing::info!(%method, %path, status = status.as_u16(), latency_ms, "request completed");
    } else if status.is_client_error() {
        tracing::warn!(%method, %path, status = status.as_u16(), latency_ms, "client error response");
    } else {
        tracing::error!(%method, %path, status = status.as_u16(), latency_ms, "server error response");
    }

    Ok(response)
}
