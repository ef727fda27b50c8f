//! Status-polling client: two independent reads per tick (job status and
//! incremental log), a monotonic byte cursor, and a derived progress
//! percentage.

use reqwest::StatusCode;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::jobs::{stage_progress, Job, LogChunk};

use super::session::ClientSession;

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1500);

/// Client-side poll state. The log offset only ever advances.
#[derive(Debug, Default, Clone, Copy)]
pub struct PollCursor {
    pub log_offset: u64,
}

impl PollCursor {
    fn advance(&mut self, offset: u64) {
        self.log_offset = self.log_offset.max(offset);
    }
}

/// One observed tick: the job record, the new log content since the last
/// tick, and the display progress for the current stage.
#[derive(Debug, Clone)]
pub struct JobSnapshot {
    pub job: Job,
    pub log: LogChunk,
    pub progress: u8,
}

pub struct JobPoller {
    http: reqwest::Client,
    session: Arc<ClientSession>,
    interval: Duration,
    stop_on_terminal: bool,
}

impl JobPoller {
    pub fn new(session: Arc<ClientSession>) -> Self {
        Self {
            http: reqwest::Client::new(),
            session,
            interval: DEFAULT_POLL_INTERVAL,
            stop_on_terminal: true,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Polling stops on terminal status by default; disable to keep the
    /// always-on behavior.
    pub fn with_stop_on_terminal(mut self, stop: bool) -> Self {
        self.stop_on_terminal = stop;
        self
    }

    pub async fn fetch_job(&self, job_id: Uuid) -> Result<Job> {
        let url = self.session.url(&format!("/api/jobs/{}", job_id));
        let response = self
            .session
            .apply_auth(self.http.get(&url))
            .send()
            .await
            .map_err(|e| AppError::Server(e.to_string()))?;

        match response.status() {
            status if status.is_success() => response
                .json::<Job>()
                .await
                .map_err(|e| AppError::Server(e.to_string())),
            StatusCode::NOT_FOUND => Err(AppError::NotFound("Job introuvable".to_string())),
            StatusCode::UNAUTHORIZED => Err(AppError::Unauthorized),
            status => Err(AppError::Server(format!("statut inattendu {}", status))),
        }
    }

    pub async fn fetch_log(&self, job_id: Uuid, offset: u64) -> Result<LogChunk> {
        let url = self
            .session
            .url(&format!("/api/jobs/{}/log?offset={}", job_id, offset));
        let response = self
            .session
            .apply_auth(self.http.get(&url))
            .send()
            .await
            .map_err(|e| AppError::Server(e.to_string()))?;

        match response.status() {
            status if status.is_success() => response
                .json::<LogChunk>()
                .await
                .map_err(|e| AppError::Server(e.to_string())),
            StatusCode::UNAUTHORIZED => Err(AppError::Unauthorized),
            status => Err(AppError::Server(format!("statut inattendu {}", status))),
        }
    }

    /// Issues the two reads of one tick concurrently. Each is independently
    /// idempotent; ordering between them is not significant.
    pub async fn poll_once(&self, job_id: Uuid, cursor: &mut PollCursor) -> Result<JobSnapshot> {
        let (job, log) = tokio::join!(
            self.fetch_job(job_id),
            self.fetch_log(job_id, cursor.log_offset)
        );
        let job = job?;
        let log = log?;

        cursor.advance(log.offset);

        Ok(JobSnapshot {
            progress: stage_progress(&job.stage),
            job,
            log,
        })
    }

    /// Polls on the fixed interval, invoking the observer on every tick,
    /// until the job reaches a terminal status (when configured) or a
    /// request fails.
    pub async fn watch<F>(&self, job_id: Uuid, mut on_update: F) -> Result<Job>
    where
        F: FnMut(&JobSnapshot),
    {
        let mut cursor = PollCursor::default();
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            let snapshot = self.poll_once(job_id, &mut cursor).await?;
            on_update(&snapshot);

            if self.stop_on_terminal && snapshot.job.is_terminal() {
                return Ok(snapshot.job);
            }
        }
    }
}
