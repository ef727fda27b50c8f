use axum::{
    extract::{Multipart, Path, Query, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::jobs::repository::load_job;
use crate::jobs::{Job, JobRunner, JobStore, SourceType};
use crate::AppState;

const DEFAULT_VOICE: &str = "Thomas";
const DEFAULT_MODEL: &str = "small";

#[derive(Debug, Deserialize)]
pub struct LogQuery {
    pub offset: Option<u64>,
}

fn job_store(state: &AppState) -> Result<&std::sync::Arc<dyn JobStore>> {
    state
        .job_store
        .as_ref()
        .ok_or_else(|| AppError::Server("Job service not available".to_string()))
}

fn job_runner(state: &AppState) -> Result<&JobRunner> {
    state
        .job_runner
        .as_ref()
        .ok_or_else(|| AppError::Server("Job service not available".to_string()))
}

pub async fn create_job(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse> {
    info!("POST /api/jobs");

    let store = job_store(&state)?;
    let runner = job_runner(&state)?;

    let mut url: Option<String> = None;
    let mut upload: Option<(String, Vec<u8>)> = None;
    let mut voice = DEFAULT_VOICE.to_string();
    let mut model = DEFAULT_MODEL.to_string();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Rejected(e.to_string()))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("url") => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::Rejected(e.to_string()))?;
                if !value.trim().is_empty() {
                    url = Some(value.trim().to_string());
                }
            }
            Some("voice") => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::Rejected(e.to_string()))?;
                if !value.trim().is_empty() {
                    voice = value;
                }
            }
            Some("model") => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::Rejected(e.to_string()))?;
                if !value.trim().is_empty() {
                    model = value;
                }
            }
            Some("file") => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Rejected(e.to_string()))?;
                // A file input left empty still submits a nameless field.
                if !filename.is_empty() || !bytes.is_empty() {
                    let filename = if filename.is_empty() {
                        "video.mp4".to_string()
                    } else {
                        filename
                    };
                    upload = Some((filename, bytes.to_vec()));
                }
            }
            _ => {}
        }
    }

    let job = match (url, upload) {
        (None, None) => {
            return Err(AppError::Rejected("Fichier ou URL requis".to_string()));
        }
        (Some(_), Some(_)) => {
            return Err(AppError::Rejected("Choisir soit URL soit fichier".to_string()));
        }
        (Some(url), None) => {
            let job = Job::new(SourceType::Url, url, voice, model);
            store.create(&job).await?;
            job
        }
        (None, Some((filename, bytes))) => {
            let mut job = Job::new(SourceType::File, String::new(), voice, model);
            let saved = store.save_upload(job.id, &filename, &bytes).await?;
            job.source = saved.to_string_lossy().into_owned();
            store.create(&job).await?;
            job
        }
    };

    runner.spawn(job.clone());

    Ok(Json(json!({ "job_id": job.id })))
}

pub async fn list_jobs(State(state): State<AppState>) -> Result<impl IntoResponse> {
    info!("GET /api/jobs");

    let jobs = job_store(&state)?.list().await?;
    Ok(Json(json!({ "jobs": jobs })))
}

pub async fn get_job(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    info!("GET /api/jobs/{}", job_id);

    let job = load_job(job_store(&state)?.as_ref(), job_id).await?;
    Ok(Json(job))
}

pub async fn get_job_log(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
    Query(query): Query<LogQuery>,
) -> Result<impl IntoResponse> {
    let chunk = job_store(&state)?
        .read_log(job_id, query.offset.unwrap_or(0))
        .await?;
    Ok(Json(chunk))
}

pub async fn delete_job(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    info!("DELETE /api/jobs/{}", job_id);

    let store = job_store(&state)?;
    load_job(store.as_ref(), job_id).await?;
    store.delete(job_id).await?;

    Ok(Json(json!({ "ok": true })))
}

pub async fn open_job_output(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    info!("POST /api/jobs/{}/open-output", job_id);

    let job = load_job(job_store(&state)?.as_ref(), job_id).await?;
    job_runner(&state)?.open_output(&job).await?;

    Ok(Json(json!({ "ok": true })))
}
