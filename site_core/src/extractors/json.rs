//! JSON extractor for submission payloads.
//!
//! The stock `Json` extractor rejects malformed bodies as 4xx; the mailer
//! contract instead folds parse failures into the 500 "Erreur serveur"
//! tier, so the body is read and parsed here with the error text preserved.

use axum::{
    async_trait,
    body::{Body, Bytes},
    extract::{FromRequest, Request},
};
use serde::de::DeserializeOwned;

use crate::error::AppError;

pub struct SubmissionJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for SubmissionJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request<Body>, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| AppError::Server(e.to_string()))?;

        // An empty body is treated as an empty object, not a parse error.
        let value = if bytes.is_empty() {
            serde_json::from_slice(b"{}")
        } else {
            serde_json::from_slice(&bytes)
        }
        .map_err(|e| AppError::Server(e.to_string()))?;

        Ok(SubmissionJson(value))
    }
}
