use lazy_static::lazy_static;
use regex::Regex;
use std::process::Stdio;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::fs;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::{mpsc, Semaphore};
use tracing::{error, info};

use crate::config::JobsConfig;
use crate::error::{AppError, Result};

use super::models::{stage, Job};
use super::repository::JobStore;

lazy_static! {
    static ref TRANSCRIPTION_MARKERS: Regex = Regex::new(r"(?i)whisper|transcri").unwrap();
    static ref TRANSLATION_MARKERS: Regex = Regex::new(r"(?i)translat|argos|traduc").unwrap();
    static ref RENDER_MARKERS: Regex = Regex::new(r"(?i)ffmpeg|mux|render").unwrap();
}

/// Maps one log line to the stage it announces, if any.
pub fn detect_stage(line: &str) -> Option<&'static str> {
    if TRANSCRIPTION_MARKERS.is_match(line) {
        Some(stage::TRANSCRIPTION)
    } else if TRANSLATION_MARKERS.is_match(line) {
        Some(stage::TRANSLATION)
    } else if RENDER_MARKERS.is_match(line) {
        Some(stage::RENDER)
    } else {
        None
    }
}

/// Executes the processing script for accepted jobs, one spawned task per
/// job, bounded by a semaphore. The runner is the only writer of job state
/// after acceptance.
#[derive(Clone)]
pub struct JobRunner {
    store: Arc<dyn JobStore>,
    config: JobsConfig,
    semaphore: Arc<Semaphore>,
}

impl JobRunner {
    pub fn new(store: Arc<dyn JobStore>, config: JobsConfig) -> Self {
        let semaphore = Arc::new(Semaphore::new(config.max_concurrent));
        Self {
            store,
            config,
            semaphore,
        }
    }

    /// Fire-and-forget execution; failures are recorded on the job itself.
    pub fn spawn(&self, job: Job) {
        let runner = self.clone();
        let job_id = job.id;
        tokio::spawn(async move {
            if let Err(e) = runner.run(job).await {
                error!("Job {} runner error: {}", job_id, e);
            }
        });
    }

    pub async fn run(&self, mut job: Job) -> Result<()> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|_| AppError::Server("runner semaphore closed".to_string()))?;

        let started = SystemTime::now();

        job.start();
        job = self.store.update(&job).await?;
        info!("Job {} started (source: {})", job.id, job.source);

        if !self.config.script.exists() {
            let message = format!("ERREUR: script introuvable: {}\n", self.config.script.display());
            self.store.append_log(job.id, &message).await?;
            job.fail("Script introuvable".to_string());
            self.store.update(&job).await?;
            return Ok(());
        }

        self.store
            .append_log(
                job.id,
                &format!("Commande: /bin/bash {} {}\n", self.config.script.display(), job.source),
            )
            .await?;
        self.store
            .append_log(job.id, &format!("Voice={} | Model={}\n", job.voice, job.model))
            .await?;

        let mut command = Command::new("/bin/bash");
        command
            .arg(&self.config.script)
            .arg(&job.source)
            .env("VOICE", &job.voice)
            .env("WHISPER_MODEL", &job.model)
            .env("MODEL", &job.model)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        if let Some(dir) = self.config.script.parent().filter(|p| p.is_dir()) {
            command.current_dir(dir);
        }

        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(e) => {
                self.store
                    .append_log(job.id, &format!("ERREUR: {}\n", e))
                    .await?;
                job.fail(e.to_string());
                self.store.update(&job).await?;
                return Ok(());
            }
        };

        let (tx, mut rx) = mpsc::unbounded_channel::<String>();
        if let Some(stdout) = child.stdout.take() {
            tokio::spawn(pump_lines(stdout, tx.clone()));
        }
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(pump_lines(stderr, tx.clone()));
        }
        drop(tx);

        while let Some(line) = rx.recv().await {
            self.store.append_log(job.id, &format!("{}\n", line)).await?;
            if let Some(detected) = detect_stage(&line) {
                if job.stage != detected {
                    job.set_stage(detected);
                    job = self.store.update(&job).await?;
                }
            }
        }

        let status = child.wait().await?;
        let exit_code = status.code().unwrap_or(-1);

        if status.success() {
            let output_dir = self.find_latest_output(started).await;
            job.succeed(exit_code, output_dir);
            info!("Job {} succeeded", job.id);
        } else {
            job.exit_code = Some(exit_code);
            job.fail(format!("Script terminé avec le code {}", exit_code));
            info!("Job {} failed with exit code {}", job.id, exit_code);
        }
        self.store.update(&job).await?;

        Ok(())
    }

    /// The script drops its results in a fresh directory under the output
    /// root; the newest directory touched since launch is the job's output.
    /// The 2s grace mirrors filesystem timestamp granularity.
    async fn find_latest_output(&self, since: SystemTime) -> Option<String> {
        let threshold = since.checked_sub(Duration::from_secs(2))?;
        let mut newest: Option<(SystemTime, String)> = None;

        let mut entries = fs::read_dir(&self.config.output_dir).await.ok()?;
        while let Ok(Some(entry)) = entries.next_entry().await {
            let Ok(file_type) = entry.file_type().await else {
                continue;
            };
            if !file_type.is_dir() {
                continue;
            }
            let Ok(metadata) = entry.metadata().await else {
                continue;
            };
            let Ok(modified) = metadata.modified() else {
                continue;
            };
            if modified < threshold {
                continue;
            }
            let candidate = entry.path().to_string_lossy().into_owned();
            if newest.as_ref().map_or(true, |(when, _)| modified > *when) {
                newest = Some((modified, candidate));
            }
        }

        newest.map(|(_, path)| path)
    }

    /// Opens the job's output directory with the configured opener.
    pub async fn open_output(&self, job: &Job) -> Result<()> {
        let output_dir = job
            .output_dir
            .as_deref()
            .ok_or_else(|| AppError::Rejected("Sortie non disponible".to_string()))?;

        Command::new(&self.config.open_command)
            .arg(output_dir)
            .spawn()
            .map_err(|e| AppError::Server(e.to_string()))?;

        Ok(())
    }
}

async fn pump_lines<R: AsyncRead + Unpin>(reader: R, tx: mpsc::UnboundedSender<String>) {
    let mut lines = BufReader::new(reader).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        if tx.send(line).is_err() {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::models::{JobStatus, SourceType};
    use crate::jobs::repository::FsJobStore;

    #[test]
    fn test_detect_stage_markers() {
        assert_eq!(detect_stage("Running whisper on chunk 3"), Some(stage::TRANSCRIPTION));
        assert_eq!(detect_stage("Transcribing audio"), Some(stage::TRANSCRIPTION));
        assert_eq!(detect_stage("argos translate fr"), Some(stage::TRANSLATION));
        assert_eq!(detect_stage("ffmpeg -i video.mp4"), Some(stage::RENDER));
        assert_eq!(detect_stage("downloading source"), None);
    }

    struct TestEnv {
        _dir: tempfile::TempDir,
        store: Arc<FsJobStore>,
        config: JobsConfig,
    }

    fn test_env(script_body: Option<&str>) -> TestEnv {
        let dir = tempfile::tempdir().unwrap();
        let data_dir = dir.path().join("jobs");
        let output_dir = dir.path().join("sorties");
        std::fs::create_dir_all(&data_dir).unwrap();
        std::fs::create_dir_all(&output_dir).unwrap();

        let script = match script_body {
            Some(body) => {
                let path = dir.path().join("process.sh");
                std::fs::write(&path, body).unwrap();
                path
            }
            None => dir.path().join("missing.sh"),
        };

        let config = JobsConfig {
            data_dir: data_dir.clone(),
            output_dir,
            script,
            open_command: "true".to_string(),
            max_concurrent: 1,
        };

        TestEnv {
            store: Arc::new(FsJobStore::new(data_dir)),
            config,
            _dir: dir,
        }
    }

    fn test_job() -> Job {
        Job::new(
            SourceType::Url,
            "https://example.com/v.mp4".to_string(),
            "Thomas".to_string(),
            "small".to_string(),
        )
    }

    #[tokio::test]
    async fn test_successful_run_progresses_through_stages() {
        let env = test_env(Some("echo placeholder\n"));
        // The script drops its result under the configured output root.
        let body = format!(
            "echo \"whisper transcription\"\necho \"argos translate\"\necho \"ffmpeg mux\"\nmkdir -p \"{}/result\"\n",
            env.config.output_dir.display()
        );
        std::fs::write(&env.config.script, body).unwrap();

        let runner = JobRunner::new(env.store.clone(), env.config.clone());
        let job = test_job();
        env.store.create(&job).await.unwrap();

        runner.run(job.clone()).await.unwrap();

        let finished = env.store.get(job.id).await.unwrap().unwrap();
        assert_eq!(finished.status, JobStatus::Succeeded);
        assert_eq!(finished.stage, stage::DONE);
        assert_eq!(finished.exit_code, Some(0));
        assert!(finished.output_dir.is_some());

        let log = env.store.read_log(job.id, 0).await.unwrap();
        assert!(log.content.contains("whisper transcription"));
        assert!(log.content.contains("Voice=Thomas | Model=small"));
    }

    #[tokio::test]
    async fn test_missing_script_fails_fast() {
        let env = test_env(None);
        let runner = JobRunner::new(env.store.clone(), env.config.clone());

        let job = test_job();
        env.store.create(&job).await.unwrap();
        runner.run(job.clone()).await.unwrap();

        let finished = env.store.get(job.id).await.unwrap().unwrap();
        assert_eq!(finished.status, JobStatus::Failed);
        assert_eq!(finished.error.as_deref(), Some("Script introuvable"));

        let log = env.store.read_log(job.id, 0).await.unwrap();
        assert!(log.content.contains("script introuvable"));
    }

    #[tokio::test]
    async fn test_nonzero_exit_marks_failed() {
        let env = test_env(Some("echo \"starting\"\nexit 3\n"));
        let runner = JobRunner::new(env.store.clone(), env.config.clone());

        let job = test_job();
        env.store.create(&job).await.unwrap();
        runner.run(job.clone()).await.unwrap();

        let finished = env.store.get(job.id).await.unwrap().unwrap();
        assert_eq!(finished.status, JobStatus::Failed);
        assert_eq!(finished.stage, stage::FAILED);
        assert_eq!(finished.exit_code, Some(3));
        assert!(finished.error.as_deref().unwrap_or_default().contains("code 3"));
    }

    #[tokio::test]
    async fn test_open_output_without_output_is_rejected() {
        let env = test_env(None);
        let runner = JobRunner::new(env.store.clone(), env.config.clone());

        let job = test_job();
        let err = runner.open_output(&job).await.unwrap_err();
        assert!(err.to_string().contains("Sortie non disponible"));
    }
}
