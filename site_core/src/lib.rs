//! Core library for the event-site backend: form-submission mailer
//! endpoints, the video-processing job API, and the client half of both
//! protocols.

pub mod client;
pub mod config;
pub mod error;
pub mod extractors;
pub mod forms;
pub mod handlers;
pub mod jobs;
pub mod mailer;
pub mod middleware;

pub use client::{ClientSession, JobPoller, SubmissionClient};
pub use config::AppConfig;
pub use error::{AppError, Result};
pub use forms::{CarpoolSubmission, RsvpSubmission, SubmissionResult};
pub use handlers::routes::{create_routes, job_routes};
pub use jobs::{FsJobStore, Job, JobRunner, JobStatus, JobStore};
pub use mailer::{Mailer, MemoryMailer, OutgoingMail, SmtpMailer};

use axum::{middleware as axum_middleware, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tracing::info;

#[derive(Clone)]
pub struct AppState {
    pub app_name: String,
    pub version: String,
    pub mailer: Arc<dyn Mailer>,
    pub job_store: Option<Arc<dyn JobStore>>,
    pub job_runner: Option<JobRunner>,
    /// Static token required on the job API; `None` disables the gate.
    pub auth_token: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            app_name: "Event Site Backend".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            mailer: Arc::new(MemoryMailer::new()),
            job_store: None,
            job_runner: None,
            auth_token: None,
        }
    }
}

impl AppState {
    pub fn with_mailer(mut self, mailer: Arc<dyn Mailer>) -> Self {
        self.mailer = mailer;
        self
    }

    pub fn with_jobs(mut self, store: Arc<dyn JobStore>, runner: JobRunner) -> Self {
        self.job_store = Some(store);
        self.job_runner = Some(runner);
        self
    }

    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        let token = token.into();
        self.auth_token = if token.is_empty() { None } else { Some(token) };
        self
    }
}

pub fn create_app(state: AppState) -> Router {
    create_app_with_config(state, AppConfig::default())
}

pub fn create_app_with_config(state: AppState, config: AppConfig) -> Router {
    let job_api = handlers::routes::job_routes().route_layer(axum_middleware::from_fn_with_state(
        state.clone(),
        middleware::auth::token_auth_middleware,
    ));

    let mut router = Router::new()
        .merge(handlers::routes::create_routes())
        .merge(job_api);

    router = router.layer(middleware::cors::cors_layer_from_config(&config.cors));
    router = router.layer(axum_middleware::from_fn(middleware::logging::log_requests));

    router.with_state(state)
}

pub async fn run_server(app: Router, addr: SocketAddr) -> Result<()> {
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if signal::ctrl_c().await.is_err() {
            tracing::error!("failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        },
        _ = terminate => {
            info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}
