use async_trait::async_trait;
use chrono::Utc;
use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use uuid::Uuid;

use crate::error::{AppError, Result};

use super::models::{Job, LogChunk};

/// How many jobs a listing returns, newest first.
pub const LIST_LIMIT: usize = 20;

#[async_trait]
pub trait JobStore: Send + Sync {
    async fn create(&self, job: &Job) -> Result<()>;
    async fn get(&self, id: Uuid) -> Result<Option<Job>>;
    async fn update(&self, job: &Job) -> Result<Job>;
    async fn list(&self) -> Result<Vec<Job>>;
    async fn delete(&self, id: Uuid) -> Result<()>;
    async fn append_log(&self, id: Uuid, line: &str) -> Result<()>;
    async fn read_log(&self, id: Uuid, offset: u64) -> Result<LogChunk>;
    async fn save_upload(&self, id: Uuid, filename: &str, bytes: &[u8]) -> Result<PathBuf>;
}

/// Filesystem-backed job store: one directory per job holding `meta.json`,
/// `log.txt` and, for uploads, the source video.
#[derive(Clone)]
pub struct FsJobStore {
    root: PathBuf,
}

impl FsJobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn job_dir(&self, id: Uuid) -> PathBuf {
        self.root.join(id.simple().to_string())
    }

    fn meta_path(&self, id: Uuid) -> PathBuf {
        self.job_dir(id).join("meta.json")
    }

    fn log_path(&self, id: Uuid) -> PathBuf {
        self.job_dir(id).join("log.txt")
    }

    async fn write_meta(&self, job: &Job) -> Result<()> {
        let meta = serde_json::to_string_pretty(job)?;
        fs::write(self.meta_path(job.id), meta).await?;
        Ok(())
    }

    async fn read_meta(&self, path: &Path) -> Result<Option<Job>> {
        match fs::read(path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl JobStore for FsJobStore {
    async fn create(&self, job: &Job) -> Result<()> {
        fs::create_dir_all(self.job_dir(job.id)).await?;
        self.write_meta(job).await?;
        self.append_log(job.id, &format!("Job {} créé.\n", job.id.simple()))
            .await?;
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Job>> {
        self.read_meta(&self.meta_path(id)).await
    }

    async fn update(&self, job: &Job) -> Result<Job> {
        let mut job = job.clone();
        job.updated_at = Utc::now();
        self.write_meta(&job).await?;
        Ok(job)
    }

    async fn list(&self) -> Result<Vec<Job>> {
        let mut jobs = Vec::new();

        let mut entries = match fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(jobs),
            Err(e) => return Err(e.into()),
        };

        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_dir() {
                continue;
            }
            // Directories without readable metadata are skipped, not fatal.
            if let Ok(Some(job)) = self.read_meta(&entry.path().join("meta.json")).await {
                jobs.push(job);
            }
        }

        jobs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        jobs.truncate(LIST_LIMIT);
        Ok(jobs)
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        if let Some(job) = self.get(id).await? {
            if let Some(output_dir) = &job.output_dir {
                let _ = fs::remove_dir_all(output_dir).await;
            }
        }
        let _ = fs::remove_dir_all(self.job_dir(id)).await;
        Ok(())
    }

    async fn append_log(&self, id: Uuid, line: &str) -> Result<()> {
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.log_path(id))
            .await?;
        file.write_all(line.as_bytes()).await?;
        Ok(())
    }

    async fn read_log(&self, id: Uuid, offset: u64) -> Result<LogChunk> {
        let mut file = match fs::File::open(self.log_path(id)).await {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(LogChunk::default());
            }
            Err(e) => return Err(e.into()),
        };

        file.seek(SeekFrom::Start(offset)).await?;
        let mut buffer = Vec::new();
        let read = file.read_to_end(&mut buffer).await? as u64;

        Ok(LogChunk {
            content: String::from_utf8_lossy(&buffer).into_owned(),
            offset: offset + read,
        })
    }

    async fn save_upload(&self, id: Uuid, filename: &str, bytes: &[u8]) -> Result<PathBuf> {
        let extension = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("mp4");
        let dest = self.job_dir(id).join(format!("source_video.{}", extension));
        fs::create_dir_all(self.job_dir(id)).await?;
        fs::write(&dest, bytes).await?;
        Ok(dest)
    }
}

/// Convenience for handlers: get-or-404 with the fixed French message.
pub async fn load_job(store: &dyn JobStore, id: Uuid) -> Result<Job> {
    store
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Job introuvable".to_string()))
}
