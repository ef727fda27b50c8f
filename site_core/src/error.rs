//! Application error types and handling

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

/// Prefix carried by every 5xx error body.
pub const SERVER_ERROR_PREFIX: &str = "Erreur serveur: ";

#[derive(Error, Debug)]
pub enum AppError {
    /// Caller's fault: missing or invalid input. Surfaced as 400.
    #[error("{0}")]
    Rejected(String),

    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Token invalide")]
    Unauthorized,

    #[error("{0}")]
    NotFound(String),

    /// Downstream dependency's fault: mail transport, script execution.
    #[error("{0}")]
    Server(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Rejected(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::MethodNotAllowed => {
                (StatusCode::METHOD_NOT_ALLOWED, "Method not allowed".to_string())
            }
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "Token invalide".to_string()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Server(msg) => {
                tracing::error!("Server error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, format!("{}{}", SERVER_ERROR_PREFIX, msg))
            }
            AppError::Io(err) => {
                tracing::error!("IO error: {:?}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, format!("{}{}", SERVER_ERROR_PREFIX, err))
            }
            AppError::Json(err) => {
                tracing::error!("JSON error: {:?}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, format!("{}{}", SERVER_ERROR_PREFIX, err))
            }
            AppError::Other(err) => {
                tracing::error!("Unexpected error: {:?}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, format!("{}{}", SERVER_ERROR_PREFIX, err))
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}
