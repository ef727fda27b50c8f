use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Named processing phases, in display order. `stage` on a job is free-form;
/// these are the labels the runner emits.
pub mod stage {
    pub const WAITING: &str = "EN_ATTENTE";
    pub const LAUNCH: &str = "LANCEMENT";
    pub const TRANSCRIPTION: &str = "TRANSCRIPTION";
    pub const TRANSLATION: &str = "TRADUCTION";
    pub const RENDER: &str = "RENDU";
    pub const DONE: &str = "TERMINE";
    pub const FAILED: &str = "ECHEC";
}

lazy_static! {
    static ref STAGE_PROGRESS: HashMap<&'static str, u8> = {
        let mut map = HashMap::new();
        map.insert(stage::WAITING, 10);
        map.insert(stage::LAUNCH, 20);
        map.insert(stage::TRANSCRIPTION, 45);
        map.insert(stage::TRANSLATION, 70);
        map.insert(stage::RENDER, 90);
        map.insert(stage::DONE, 100);
        map.insert(stage::FAILED, 100);
        map
    };
}

/// Display progress percentage for a stage label. Unknown labels sit at 15,
/// between "accepted" and "launched".
pub fn stage_progress(stage: &str) -> u8 {
    STAGE_PROGRESS.get(stage).copied().unwrap_or(15)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Succeeded | JobStatus::Failed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    Url,
    File,
}

/// One processing job. Owned and mutated by the runner; everything else
/// only reads it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: Uuid,
    pub status: JobStatus,
    pub stage: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub source_type: SourceType,
    pub source: String,
    pub voice: String,
    pub model: String,
    pub output_dir: Option<String>,
    pub exit_code: Option<i32>,
    pub error: Option<String>,
}

impl Job {
    pub fn new(source_type: SourceType, source: String, voice: String, model: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            status: JobStatus::Pending,
            stage: stage::WAITING.to_string(),
            created_at: now,
            updated_at: now,
            source_type,
            source,
            voice,
            model,
            output_dir: None,
            exit_code: None,
            error: None,
        }
    }

    pub fn start(&mut self) {
        self.status = JobStatus::Running;
        self.stage = stage::LAUNCH.to_string();
    }

    pub fn set_stage(&mut self, stage: &str) {
        self.stage = stage.to_string();
    }

    pub fn succeed(&mut self, exit_code: i32, output_dir: Option<String>) {
        self.status = JobStatus::Succeeded;
        self.stage = stage::DONE.to_string();
        self.exit_code = Some(exit_code);
        self.output_dir = output_dir;
    }

    pub fn fail(&mut self, error: String) {
        self.status = JobStatus::Failed;
        self.stage = stage::FAILED.to_string();
        self.error = Some(error);
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

/// One incremental log read. `offset` is the byte cursor to pass on the
/// next read; it never moves backwards.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogChunk {
    pub content: String,
    pub offset: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_job_is_pending_and_waiting() {
        let job = Job::new(
            SourceType::Url,
            "https://example.com/v.mp4".to_string(),
            "Thomas".to_string(),
            "small".to_string(),
        );
        assert_eq!(job.status, JobStatus::Pending);
        assert_eq!(job.stage, stage::WAITING);
        assert!(!job.is_terminal());
    }

    #[test]
    fn test_lifecycle_transitions() {
        let mut job = Job::new(
            SourceType::File,
            "/tmp/source.mp4".to_string(),
            "Thomas".to_string(),
            "small".to_string(),
        );

        job.start();
        assert_eq!(job.status, JobStatus::Running);
        assert_eq!(job.stage, stage::LAUNCH);

        job.succeed(0, Some("/out/dir".to_string()));
        assert_eq!(job.status, JobStatus::Succeeded);
        assert_eq!(job.stage, stage::DONE);
        assert!(job.is_terminal());
    }

    #[test]
    fn test_failure_records_error() {
        let mut job = Job::new(
            SourceType::Url,
            "u".to_string(),
            "v".to_string(),
            "m".to_string(),
        );
        job.fail("Script introuvable".to_string());
        assert_eq!(job.status, JobStatus::Failed);
        assert_eq!(job.stage, stage::FAILED);
        assert_eq!(job.error.as_deref(), Some("Script introuvable"));
    }

    #[test]
    fn test_stage_progress_mapping() {
        assert_eq!(stage_progress(stage::WAITING), 10);
        assert_eq!(stage_progress(stage::TRANSCRIPTION), 45);
        assert_eq!(stage_progress(stage::DONE), 100);
        assert_eq!(stage_progress("UNKNOWN_LABEL"), 15);
    }

    #[test]
    fn test_status_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&JobStatus::Succeeded).unwrap(), "\"succeeded\"");
        assert_eq!(serde_json::to_string(&SourceType::Url).unwrap(), "\"url\"");
    }
}
