use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;
use uuid::Uuid;

use site_core::config::JobsConfig;
use site_core::jobs::{Job, SourceType};
use site_core::{create_app, AppState, FsJobStore, JobRunner, JobStore};

const BOUNDARY: &str = "test-boundary-7MA4YWxkTrZu0gW";

struct TestContext {
    state: AppState,
    store: Arc<FsJobStore>,
    _dir: tempfile::TempDir,
}

fn test_context(token: Option<&str>) -> TestContext {
    let dir = tempfile::tempdir().unwrap();
    let data_dir = dir.path().join("jobs");
    let output_dir = dir.path().join("sorties");
    std::fs::create_dir_all(&data_dir).unwrap();
    std::fs::create_dir_all(&output_dir).unwrap();

    let script = dir.path().join("process.sh");
    std::fs::write(&script, "echo ok\n").unwrap();

    let config = JobsConfig {
        data_dir: data_dir.clone(),
        output_dir,
        script,
        open_command: "true".to_string(),
        max_concurrent: 2,
    };

    let store = Arc::new(FsJobStore::new(data_dir));
    let runner = JobRunner::new(store.clone(), config);

    let mut state = AppState::default().with_jobs(store.clone(), runner);
    if let Some(token) = token {
        state = state.with_auth_token(token);
    }

    TestContext {
        state,
        store,
        _dir: dir,
    }
}

fn text_part(name: &str, value: &str) -> String {
    format!(
        "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
        BOUNDARY, name, value
    )
}

fn file_part(name: &str, filename: &str, content: &str) -> String {
    format!(
        "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n{}\r\n",
        BOUNDARY, name, filename, content
    )
}

fn multipart_request(parts: &[String]) -> Request<Body> {
    let body = format!("{}--{}--\r\n", parts.concat(), BOUNDARY);
    Request::builder()
        .method("POST")
        .uri("/api/jobs")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_create_job_from_url() {
    let ctx = test_context(None);
    let app = create_app(ctx.state.clone());

    let response = app
        .oneshot(multipart_request(&[text_part(
            "url",
            "https://example.com/video.mp4",
        )]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let job_id = Uuid::parse_str(body["job_id"].as_str().unwrap()).unwrap();

    let job = ctx.store.get(job_id).await.unwrap().unwrap();
    assert_eq!(job.source, "https://example.com/video.mp4");
    assert_eq!(job.voice, "Thomas");
    assert_eq!(job.model, "small");

    // The trivial script finishes almost immediately.
    tokio::time::sleep(Duration::from_millis(500)).await;
    let job = ctx.store.get(job_id).await.unwrap().unwrap();
    assert!(job.is_terminal());

    let log = ctx.store.read_log(job_id, 0).await.unwrap();
    assert!(log.content.contains("créé"));
    assert!(log.content.contains("ok"));
}

#[tokio::test]
async fn test_create_job_from_upload() {
    let ctx = test_context(None);
    let app = create_app(ctx.state.clone());

    let response = app
        .oneshot(multipart_request(&[
            file_part("file", "clip.mov", "fake video bytes"),
            text_part("voice", "Amelie"),
            text_part("model", "base"),
        ]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let job_id = Uuid::parse_str(body["job_id"].as_str().unwrap()).unwrap();

    let job = ctx.store.get(job_id).await.unwrap().unwrap();
    assert!(job.source.ends_with("source_video.mov"));
    assert_eq!(job.voice, "Amelie");
    assert_eq!(job.model, "base");
    assert!(std::path::Path::new(&job.source).exists());
}

#[tokio::test]
async fn test_create_job_requires_url_or_file() {
    let ctx = test_context(None);
    let app = create_app(ctx.state.clone());

    let response = app
        .oneshot(multipart_request(&[text_part("voice", "Thomas")]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Fichier ou URL requis");

    assert!(ctx.store.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_create_job_refuses_both_url_and_file() {
    let ctx = test_context(None);
    let app = create_app(ctx.state.clone());

    let response = app
        .oneshot(multipart_request(&[
            text_part("url", "https://example.com/video.mp4"),
            file_part("file", "clip.mp4", "bytes"),
        ]))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Choisir soit URL soit fichier");

    assert!(ctx.store.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_get_unknown_job_is_404() {
    let ctx = test_context(None);
    let app = create_app(ctx.state.clone());

    let request = Request::builder()
        .uri(format!("/api/jobs/{}", Uuid::new_v4()))
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Job introuvable");
}

#[tokio::test]
async fn test_list_jobs_returns_records() {
    let ctx = test_context(None);

    let job = Job::new(
        SourceType::Url,
        "https://example.com/v.mp4".to_string(),
        "Thomas".to_string(),
        "small".to_string(),
    );
    ctx.store.create(&job).await.unwrap();

    let app = create_app(ctx.state.clone());
    let request = Request::builder()
        .uri("/api/jobs")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let jobs = body["jobs"].as_array().unwrap();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0]["status"], "pending");
    assert_eq!(jobs[0]["stage"], "EN_ATTENTE");
}

#[tokio::test]
async fn test_log_endpoint_advances_offset() {
    let ctx = test_context(None);

    let job = Job::new(
        SourceType::Url,
        "https://example.com/v.mp4".to_string(),
        "Thomas".to_string(),
        "small".to_string(),
    );
    ctx.store.create(&job).await.unwrap();

    let app = create_app(ctx.state.clone());

    let request = Request::builder()
        .uri(format!("/api/jobs/{}/log?offset=0", job.id))
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert!(body["content"].as_str().unwrap().contains("créé"));
    let offset = body["offset"].as_u64().unwrap();
    assert!(offset > 0);

    let request = Request::builder()
        .uri(format!("/api/jobs/{}/log?offset={}", job.id, offset))
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    let body = body_json(response).await;
    assert_eq!(body["content"], "");
    assert_eq!(body["offset"].as_u64().unwrap(), offset);
}

#[tokio::test]
async fn test_delete_job_removes_it() {
    let ctx = test_context(None);

    let job = Job::new(
        SourceType::Url,
        "https://example.com/v.mp4".to_string(),
        "Thomas".to_string(),
        "small".to_string(),
    );
    ctx.store.create(&job).await.unwrap();

    let app = create_app(ctx.state.clone());

    let request = Request::builder()
        .method("DELETE")
        .uri(format!("/api/jobs/{}", job.id))
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["ok"], true);

    let request = Request::builder()
        .uri(format!("/api/jobs/{}", job.id))
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_open_output_without_output_is_400() {
    let ctx = test_context(None);

    let job = Job::new(
        SourceType::Url,
        "https://example.com/v.mp4".to_string(),
        "Thomas".to_string(),
        "small".to_string(),
    );
    ctx.store.create(&job).await.unwrap();

    let app = create_app(ctx.state.clone());
    let request = Request::builder()
        .method("POST")
        .uri(format!("/api/jobs/{}/open-output", job.id))
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Sortie non disponible");
}

#[tokio::test]
async fn test_job_api_requires_token_when_configured() {
    let ctx = test_context(Some("s3cret"));
    let app = create_app(ctx.state.clone());

    let request = Request::builder()
        .uri("/api/jobs")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Token invalide");

    let request = Request::builder()
        .uri("/api/jobs")
        .header("x-token", "s3cret")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let request = Request::builder()
        .uri("/api/jobs")
        .header("authorization", "Bearer s3cret")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_mailer_endpoints_stay_public_with_token_configured() {
    let ctx = test_context(Some("s3cret"));
    let app = create_app(ctx.state.clone());

    let request = Request::builder()
        .method("POST")
        .uri("/api/carpool")
        .header("content-type", "application/json")
        .body(Body::from(
            r#"{"name":"Alice","city":"Lyon","seats":"2","contact":"a@x.com"}"#,
        ))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
