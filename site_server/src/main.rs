//! Main entry point for the event-site server binary

use anyhow::Result;
use site_core::{
    create_app_with_config, run_server, AppConfig, AppState, FsJobStore, JobRunner, MemoryMailer,
    SmtpMailer,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let config = AppConfig::load()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

    info!("Configuration loaded successfully");
    info!("Server will bind to: {}", config.bind_address());

    config
        .create_directories()
        .map_err(|e| anyhow::anyhow!("Failed to create directories: {}", e))?;

    let addr: SocketAddr = config
        .bind_address()
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid bind address: {}", e))?;

    let mailer: Arc<dyn site_core::Mailer> = if config.smtp.host.is_empty() {
        tracing::warn!("No SMTP host configured, notifications are recorded in memory only");
        Arc::new(MemoryMailer::new())
    } else {
        info!("SMTP transport: {}:{}", config.smtp.host, config.smtp.port);
        Arc::new(
            SmtpMailer::from_config(&config.smtp)
                .map_err(|e| anyhow::anyhow!("Failed to configure SMTP transport: {}", e))?,
        )
    };

    let job_store = Arc::new(FsJobStore::new(config.jobs.data_dir.clone()));
    let job_runner = JobRunner::new(job_store.clone(), config.jobs.clone());
    info!(
        "Job service: data in {}, outputs in {}",
        config.jobs.data_dir.display(),
        config.jobs.output_dir.display()
    );

    if config.auth.token.is_empty() {
        info!("Job API token disabled");
    } else {
        info!("Job API token enabled");
    }

    let state = AppState::default()
        .with_mailer(mailer)
        .with_jobs(job_store, job_runner)
        .with_auth_token(config.auth.token.clone());

    info!("App: {} v{}", state.app_name, state.version);

    let app = create_app_with_config(state, config);

    run_server(app, addr).await?;

    info!("Server shutdown complete");
    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let default_level = if cfg!(debug_assertions) { "debug" } else { "info" };

        format!(
            "{}={},tower_http=debug,axum=debug",
            env!("CARGO_CRATE_NAME").replace('-', "_"),
            default_level
        )
        .into()
    });

    let fmt_layer = fmt::layer().with_target(true);

    let is_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    if is_json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer.json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer.pretty())
            .init();
    }
}
